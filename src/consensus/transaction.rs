//! Consensus-update transactions that carry out a decided [`Behaviour`].

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    config::Configuration,
    types::{
        behaviour::Behaviour,
        crypto_primitives::{address_of, VerifyingKey},
        data_types::Address,
        round::{Round, RoundBytes},
    },
};

/// A call from a miner into the consensus contract.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ConsensusTransaction {
    /// Address of the miner.
    pub from: Address,
    /// Address of the consensus contract.
    pub to: Address,
    /// See [`Behaviour::method_name`].
    pub method_name: String,
    /// Borsh encoding of the round that the behaviour operates on.
    pub params: Vec<u8>,
}

impl ConsensusTransaction {
    /// Build the transaction through which the miner identified by `public_key` carries out `behaviour`.
    ///
    /// `round` is the current round for the update behaviours and `TinyBlock`, and the round that is about
    /// to be created for `NextRound` and `NextTerm`. Returns `Ok(None)` for [`Behaviour::Nothing`].
    pub fn generate(
        config: &Configuration,
        public_key: &VerifyingKey,
        behaviour: Behaviour,
        round: &Round,
    ) -> Result<Option<ConsensusTransaction>, std::io::Error> {
        let method_name = match behaviour.method_name() {
            Some(method_name) => method_name,
            None => return Ok(None),
        };

        Ok(Some(ConsensusTransaction {
            from: address_of(public_key),
            to: config.contract_address,
            method_name: method_name.to_string(),
            params: RoundBytes::from(round).try_to_vec()?,
        }))
    }

    /// Decode the round carried in `params`.
    pub fn round(&self) -> Result<Round, ParamsError> {
        let round_bytes = RoundBytes::deserialize(&mut self.params.as_slice())
            .map_err(ParamsError::DeserializeRoundError)?;
        Round::try_from(round_bytes).map_err(ParamsError::Ed25519DalekError)
    }
}

/// Error when trying to decode the `params` of a [`ConsensusTransaction`].
#[derive(Debug)]
pub enum ParamsError {
    DeserializeRoundError(std::io::Error),
    Ed25519DalekError(ed25519_dalek::SignatureError),
}
