// ******************************************************************************************************************************
// Catalyst payload structure
// ******************************************************************************************************************************

// Common Payload               Start       Length
//    CONTEXT                   0           1
//    + FROM_VAULT              1           65
//    + TO_VAULT                66          65
//    + TO_ACCOUNT              131         65
//    + UNITS                   196         32
//
// Context-dependent Payload
//    CTX0 - 0x00 - Asset Swap Payload
//       + TO_ASSET_INDEX       228         1
//       + MIN_OUT              229         32
//       + FROM_AMOUNT          261         32
//       + FROM_ASSET           293         65
//       + BLOCK_NUMBER         358         4
//       + SOURCE_CHANNEL       362         65
//       + SEQUENCE             427         8
//
//    CTX1 - 0x01 - Liquidity Swap Payload
//       + MIN_VAULT_TOKENS     228         32
//       + MIN_REFERENCE        260         32
//       + FROM_AMOUNT          292         32
//       + BLOCK_NUMBER         324         4
//       + SOURCE_CHANNEL       328         65
//       + SEQUENCE             393         8
//
// All integers are big endian.


// Contexts *********************************************************************************************************************

pub const CTX0_ASSET_SWAP            : u8 = 0x00;
pub const CTX1_LIQUIDITY_SWAP        : u8 = 0x01;



// Payload layout ***************************************************************************************************************

pub const CONTEXT_POS                : usize = 0;

pub const FROM_VAULT_START           : usize = 1;
pub const FROM_VAULT_END             : usize = 66;

pub const TO_VAULT_START             : usize = 66;
pub const TO_VAULT_END               : usize = 131;

pub const TO_ACCOUNT_START           : usize = 131;
pub const TO_ACCOUNT_END             : usize = 196;

pub const UNITS_START                : usize = 196;
pub const UNITS_END                  : usize = 228;

pub const CTX0_TO_ASSET_INDEX_POS    : usize = 228;

pub const CTX0_MIN_OUT_START         : usize = 229;
pub const CTX0_MIN_OUT_END           : usize = 261;

pub const CTX0_FROM_AMOUNT_START     : usize = 261;
pub const CTX0_FROM_AMOUNT_END       : usize = 293;

pub const CTX0_FROM_ASSET_START      : usize = 293;
pub const CTX0_FROM_ASSET_END        : usize = 358;

pub const CTX0_BLOCK_NUMBER_START    : usize = 358;
pub const CTX0_BLOCK_NUMBER_END      : usize = 362;

pub const CTX0_SOURCE_CHANNEL_START  : usize = 362;
pub const CTX0_SOURCE_CHANNEL_END    : usize = 427;

pub const CTX0_SEQUENCE_START        : usize = 427;
pub const CTX0_SEQUENCE_END          : usize = 435;

pub const CTX0_PAYLOAD_LENGTH        : usize = 435;


// CTX1 Liquidity Swap Payload **************************************************************************************************

pub const CTX1_MIN_VAULT_TOKENS_START: usize = 228;
pub const CTX1_MIN_VAULT_TOKENS_END  : usize = 260;

pub const CTX1_MIN_REFERENCE_START   : usize = 260;
pub const CTX1_MIN_REFERENCE_END     : usize = 292;

pub const CTX1_FROM_AMOUNT_START     : usize = 292;
pub const CTX1_FROM_AMOUNT_END       : usize = 324;

pub const CTX1_BLOCK_NUMBER_START    : usize = 324;
pub const CTX1_BLOCK_NUMBER_END      : usize = 328;

pub const CTX1_SOURCE_CHANNEL_START  : usize = 328;
pub const CTX1_SOURCE_CHANNEL_END    : usize = 393;

pub const CTX1_SEQUENCE_START        : usize = 393;
pub const CTX1_SEQUENCE_END          : usize = 401;

pub const CTX1_PAYLOAD_LENGTH        : usize = 401;





// ******************************************************************************************************************************
// Payload Helpers
// ******************************************************************************************************************************
use catalyst_vault::escrow::PacketId;
use cosmwasm_std::Binary;
use fixed_point_math::U256;

use crate::error::InterfaceError;


/// Encoding of a cross chain asset swap.
///
/// # Fields:
/// * `from_vault` - The source vault.
/// * `to_vault` - The target vault.
/// * `to_account` - The destination account.
/// * `u` - The transferred units.
/// * `to_asset_index` - The target asset index.
/// * `min_out` - The minimum output.
/// * `from_amount` - The source asset amount (escrowed on the source vault).
/// * `from_asset` - The source asset.
/// * `block_number` - The block number at which the swap was committed (modulo 2^32).
/// * `source_channel` - The channel the packet was sent over.
/// * `sequence` - The sequence of the packet on `source_channel`.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalystV1SendAssetPayload {
    pub from_vault: CatalystEncodedAddress,
    pub to_vault: CatalystEncodedAddress,
    pub to_account: CatalystEncodedAddress,
    pub u: U256,
    pub to_asset_index: u8,
    pub min_out: U256,
    pub from_amount: U256,
    pub from_asset: CatalystEncodedAddress,
    pub block_number: u32,
    pub source_channel: CatalystEncodedAddress,
    pub sequence: u64
}

impl CatalystV1SendAssetPayload {

    /// Encode the payload into its binary representation.
    pub fn encode(&self) -> Binary {

        let mut data: Vec<u8> = Vec::with_capacity(CTX0_PAYLOAD_LENGTH);

        data.push(CTX0_ASSET_SWAP);
        data.extend_from_slice(self.from_vault.as_ref());
        data.extend_from_slice(self.to_vault.as_ref());
        data.extend_from_slice(self.to_account.as_ref());
        data.extend_from_slice(&self.u.to_be_bytes());
        data.push(self.to_asset_index);
        data.extend_from_slice(&self.min_out.to_be_bytes());
        data.extend_from_slice(&self.from_amount.to_be_bytes());
        data.extend_from_slice(self.from_asset.as_ref());
        data.extend_from_slice(&self.block_number.to_be_bytes());
        data.extend_from_slice(self.source_channel.as_ref());
        data.extend_from_slice(&self.sequence.to_be_bytes());

        Binary(data)
    }


    /// Decode a Catalyst asset swap payload.
    ///
    /// Fails with `PayloadDecodingError` if the payload has an unexpected length or context, or
    /// if any of its encoded addresses is malformed.
    ///
    pub fn try_decode(data: &[u8]) -> Result<Self, InterfaceError> {

        if data.len() != CTX0_PAYLOAD_LENGTH {
            return Err(InterfaceError::PayloadDecodingError {});
        }

        let context = data.get(CONTEXT_POS).ok_or(InterfaceError::PayloadDecodingError {})?;
        if *context != CTX0_ASSET_SWAP {
            return Err(InterfaceError::PayloadDecodingError {});
        }

        let to_asset_index = *data.get(CTX0_TO_ASSET_INDEX_POS)
            .ok_or(InterfaceError::PayloadDecodingError {})?;

        Ok(Self {
            from_vault: decode_address(data, FROM_VAULT_START, FROM_VAULT_END)?,
            to_vault: decode_address(data, TO_VAULT_START, TO_VAULT_END)?,
            to_account: decode_address(data, TO_ACCOUNT_START, TO_ACCOUNT_END)?,
            u: U256::from_be_bytes(read_array(data, UNITS_START)?),
            to_asset_index,
            min_out: U256::from_be_bytes(read_array(data, CTX0_MIN_OUT_START)?),
            from_amount: U256::from_be_bytes(read_array(data, CTX0_FROM_AMOUNT_START)?),
            from_asset: decode_address(data, CTX0_FROM_ASSET_START, CTX0_FROM_ASSET_END)?,
            block_number: u32::from_be_bytes(read_array(data, CTX0_BLOCK_NUMBER_START)?),
            source_channel: decode_address(data, CTX0_SOURCE_CHANNEL_START, CTX0_SOURCE_CHANNEL_END)?,
            sequence: u64::from_be_bytes(read_array(data, CTX0_SEQUENCE_START)?)
        })
    }


    /// The id of the packet carrying this payload, as assigned by the source chain.
    pub fn packet_id(&self) -> Result<PacketId, InterfaceError> {
        Ok(PacketId::new(
            self.source_channel.try_decode_as_string()?,
            self.sequence
        ))
    }
}


/// Encoding of a cross chain liquidity swap.
///
/// # Fields:
/// * `from_vault` - The source vault.
/// * `to_vault` - The target vault.
/// * `to_account` - The destination account.
/// * `u` - The transferred units.
/// * `min_vault_tokens` - The minimum vault token output.
/// * `min_reference_asset` - The minimum reference asset value of the vault token output.
/// * `from_amount` - The vault tokens burnt (escrowed on the source vault).
/// * `block_number` - The block number at which the swap was committed (modulo 2^32).
/// * `source_channel` - The channel the packet was sent over.
/// * `sequence` - The sequence of the packet on `source_channel`.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalystV1SendLiquidityPayload {
    pub from_vault: CatalystEncodedAddress,
    pub to_vault: CatalystEncodedAddress,
    pub to_account: CatalystEncodedAddress,
    pub u: U256,
    pub min_vault_tokens: U256,
    pub min_reference_asset: U256,
    pub from_amount: U256,
    pub block_number: u32,
    pub source_channel: CatalystEncodedAddress,
    pub sequence: u64
}

impl CatalystV1SendLiquidityPayload {

    /// Encode the payload into its binary representation.
    pub fn encode(&self) -> Binary {

        let mut data: Vec<u8> = Vec::with_capacity(CTX1_PAYLOAD_LENGTH);

        data.push(CTX1_LIQUIDITY_SWAP);
        data.extend_from_slice(self.from_vault.as_ref());
        data.extend_from_slice(self.to_vault.as_ref());
        data.extend_from_slice(self.to_account.as_ref());
        data.extend_from_slice(&self.u.to_be_bytes());
        data.extend_from_slice(&self.min_vault_tokens.to_be_bytes());
        data.extend_from_slice(&self.min_reference_asset.to_be_bytes());
        data.extend_from_slice(&self.from_amount.to_be_bytes());
        data.extend_from_slice(&self.block_number.to_be_bytes());
        data.extend_from_slice(self.source_channel.as_ref());
        data.extend_from_slice(&self.sequence.to_be_bytes());

        Binary(data)
    }


    /// Decode a Catalyst liquidity swap payload.
    pub fn try_decode(data: &[u8]) -> Result<Self, InterfaceError> {

        if data.len() != CTX1_PAYLOAD_LENGTH {
            return Err(InterfaceError::PayloadDecodingError {});
        }

        let context = data.get(CONTEXT_POS).ok_or(InterfaceError::PayloadDecodingError {})?;
        if *context != CTX1_LIQUIDITY_SWAP {
            return Err(InterfaceError::PayloadDecodingError {});
        }

        Ok(Self {
            from_vault: decode_address(data, FROM_VAULT_START, FROM_VAULT_END)?,
            to_vault: decode_address(data, TO_VAULT_START, TO_VAULT_END)?,
            to_account: decode_address(data, TO_ACCOUNT_START, TO_ACCOUNT_END)?,
            u: U256::from_be_bytes(read_array(data, UNITS_START)?),
            min_vault_tokens: U256::from_be_bytes(read_array(data, CTX1_MIN_VAULT_TOKENS_START)?),
            min_reference_asset: U256::from_be_bytes(read_array(data, CTX1_MIN_REFERENCE_START)?),
            from_amount: U256::from_be_bytes(read_array(data, CTX1_FROM_AMOUNT_START)?),
            block_number: u32::from_be_bytes(read_array(data, CTX1_BLOCK_NUMBER_START)?),
            source_channel: decode_address(data, CTX1_SOURCE_CHANNEL_START, CTX1_SOURCE_CHANNEL_END)?,
            sequence: u64::from_be_bytes(read_array(data, CTX1_SEQUENCE_START)?)
        })
    }


    /// The id of the packet carrying this payload, as assigned by the source chain.
    pub fn packet_id(&self) -> Result<PacketId, InterfaceError> {
        Ok(PacketId::new(
            self.source_channel.try_decode_as_string()?,
            self.sequence
        ))
    }
}



// Catalyst Packet **************************************************************************************************************

/// The structures a Catalyst payload may take, selected by its context byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalystV1Packet {
    SendAsset(CatalystV1SendAssetPayload),
    SendLiquidity(CatalystV1SendLiquidityPayload)
}

impl CatalystV1Packet {

    pub fn encode(&self) -> Binary {
        match self {
            CatalystV1Packet::SendAsset(payload) => payload.encode(),
            CatalystV1Packet::SendLiquidity(payload) => payload.encode()
        }
    }

    pub fn try_decode(data: &[u8]) -> Result<Self, InterfaceError> {

        let context = data.get(CONTEXT_POS).ok_or(InterfaceError::PayloadDecodingError {})?;

        match *context {
            CTX0_ASSET_SWAP => Ok(CatalystV1Packet::SendAsset(
                CatalystV1SendAssetPayload::try_decode(data)?
            )),
            CTX1_LIQUIDITY_SWAP => Ok(CatalystV1Packet::SendLiquidity(
                CatalystV1SendLiquidityPayload::try_decode(data)?
            )),
            _ => Err(InterfaceError::PayloadDecodingError {})
        }
    }

    pub fn from_vault(&self) -> &CatalystEncodedAddress {
        match self {
            CatalystV1Packet::SendAsset(payload) => &payload.from_vault,
            CatalystV1Packet::SendLiquidity(payload) => &payload.from_vault
        }
    }

    pub fn to_vault(&self) -> &CatalystEncodedAddress {
        match self {
            CatalystV1Packet::SendAsset(payload) => &payload.to_vault,
            CatalystV1Packet::SendLiquidity(payload) => &payload.to_vault
        }
    }

    pub fn packet_id(&self) -> Result<PacketId, InterfaceError> {
        match self {
            CatalystV1Packet::SendAsset(payload) => payload.packet_id(),
            CatalystV1Packet::SendLiquidity(payload) => payload.packet_id()
        }
    }
}



fn read_array<const N: usize>(data: &[u8], start: usize) -> Result<[u8; N], InterfaceError> {
    data.get(start .. start + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(InterfaceError::PayloadDecodingError {})
}

fn decode_address(data: &[u8], start: usize, end: usize) -> Result<CatalystEncodedAddress, InterfaceError> {
    data.get(start .. end)
        .ok_or(InterfaceError::PayloadDecodingError {})
        .and_then(|slice| {
            CatalystEncodedAddress::try_from(slice)
                .map_err(|_| InterfaceError::PayloadDecodingError {})
        })
}



// Encoded addresses ************************************************************************************************************

/// Wrapper around a bytes array for encoding/decoding of Catalyst's 65-byte payload addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalystEncodedAddress([u8; 65]);

impl AsRef<[u8]> for CatalystEncodedAddress {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl From<CatalystEncodedAddress> for Binary {
    fn from(value: CatalystEncodedAddress) -> Self {
        Binary(value.0.to_vec())
    }
}

impl TryFrom<&[u8]> for CatalystEncodedAddress {
    type Error = InterfaceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {

        let bytes: [u8; Self::LENGTH] = value
            .try_into()
            .map_err(|_| InterfaceError::InvalidCatalystEncodedAddress {})?;

        let address_length = bytes[0] as usize;
        if address_length >= Self::LENGTH {
            return Err(InterfaceError::InvalidCatalystEncodedAddress {})
        }

        // The bytes between the length prefix and the address must be zero
        if bytes[1 .. Self::LENGTH - address_length].iter().any(|byte| *byte != 0) {
            return Err(InterfaceError::InvalidCatalystEncodedAddress {})
        }

        Ok(Self(bytes))
    }
}

impl TryFrom<&Binary> for CatalystEncodedAddress {
    type Error = InterfaceError;

    fn try_from(value: &Binary) -> Result<Self, Self::Error> {
        Self::try_from(value.as_slice())
    }
}


impl CatalystEncodedAddress {

    pub const LENGTH: usize = 65;

    /// Return a Binary representation of the address.
    pub fn to_binary(&self) -> Binary {
        Binary(self.0.to_vec())
    }

    /// Try to encode an address from a slice. The encoded address always has fixed length
    /// (`LENGTH`), and is of the following form:
    ///     <Address length (1 byte)> <Zero padding> <Address>
    ///
    /// # Arguments:
    /// * `address` - The slice that is to be encoded.
    ///
    pub fn try_encode(address: &[u8]) -> Result<Self, InterfaceError> {

        let address_len = address.len();
        if address_len > (Self::LENGTH - 1) {   // The first byte is reserved for the address length
            return Err(InterfaceError::PayloadEncodingError {});
        }

        let mut encoded_address = [0u8; Self::LENGTH];
        encoded_address[0] = address_len as u8;     // Casting to u8 is safe, as address_len is < Self::LENGTH < u8.max

        encoded_address[Self::LENGTH - address_len..].copy_from_slice(address);

        Ok(Self(encoded_address))
    }

    /// Decode a Catalyst-encoded address into a vector of bytes.
    pub fn try_decode(&self) -> Result<Vec<u8>, InterfaceError> {

        let address_start_byte = Self::LENGTH
            .checked_sub(self.0[0] as usize)
            .ok_or(InterfaceError::InvalidCatalystEncodedAddress {})?;

        self.0.get(address_start_byte..)
            .ok_or(InterfaceError::PayloadDecodingError {})
            .map(|slice| slice.to_vec())
    }

    /// Decode a Catalyst-encoded address into a utf8 string.
    pub fn try_decode_as_string(&self) -> Result<String, InterfaceError> {
        String::from_utf8(
            self.try_decode()?
        ).map_err(|_| InterfaceError::PayloadDecodingError {})
    }
}
