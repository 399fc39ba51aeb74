use std::collections::VecDeque;

use cosmwasm_std::IbcPacket;
use parking_lot::Mutex;


/// In-flight packet buffer, standing in for the transport between two chains.
#[derive(Default)]
pub struct PacketQueue {
    packets: Mutex<VecDeque<IbcPacket>>
}

impl PacketQueue {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, packet: IbcPacket) {
        self.packets.lock().push_back(packet);
    }

    pub fn pop(&self) -> Option<IbcPacket> {
        self.packets.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }
}
