use cosmwasm_std::{Addr, Uint128};
use vault_assets::{AssetLedger, MemoryLedger};


/// Create a ledger holding the given assets.
pub fn mock_ledger(assets: &[&str]) -> MemoryLedger {
    let ledger = MemoryLedger::new();
    for asset in assets {
        ledger.create_asset(asset).unwrap();
    }
    ledger
}


/// Fund `account` with `amount` of `asset` and approve `spender` to pull it.
pub fn fund_and_approve(
    ledger: &MemoryLedger,
    asset: &str,
    account: &str,
    spender: &Addr,
    amount: Uint128
) {
    let account = Addr::unchecked(account);
    ledger.mint(asset, &account, amount).unwrap();
    ledger.approve(asset, &account, spender, amount).unwrap();
}


pub fn query_balance<L: AssetLedger>(ledger: &L, asset: &str, account: &str) -> Uint128 {
    ledger.balance_of(asset, &Addr::unchecked(account)).unwrap()
}
