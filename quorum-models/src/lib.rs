// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Value types shared by the ledger, staking, slashing and execution crates.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

pub use account::{Account, AccountDeserializer, AccountSerializer};
pub use address::{Address, AddressDeserializer, AddressSerializer};
pub use block::BlockHeader;
pub use coin::{
    Coin, CoinDeserializer, CoinSerializer, Coins, CoinsDeserializer, CoinsSerializer,
};
pub use dec::{Dec, DecDeserializer, DecSerializer};
pub use dec_coin::{DecCoin, DecCoins, DecCoinsDeserializer, DecCoinsSerializer};
pub use error::{ModelsError, ModelsResult};
pub use int::{Int, IntDeserializer, IntSerializer};

mod account;
/// addresses
pub mod address;
mod block;
mod coin;
/// constants
pub mod constants;
mod dec;
mod dec_coin;
/// models error
pub mod error;
mod int;

#[cfg(test)]
mod tests;
