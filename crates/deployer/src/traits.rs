//! Trait definitions for the contract deployment boundary.
//!
//! The runner only talks to an Ethereum node through [`Deployer`] which
//! enables unit testing with mocks.

use {
    crate::artifact::Factory,
    alloy::primitives::{Address, TxHash},
};

/// Everything that can go wrong while deploying a contract.
///
/// The variants follow the order of the deployment steps so the step that
/// failed can be told from the error alone.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to resolve contract factory for {contract}")]
    FactoryResolution {
        contract: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to submit deployment transaction")]
    DeploymentSubmission(#[source] anyhow::Error),
    #[error("deployment transaction {tx_hash} was not confirmed")]
    Confirmation {
        tx_hash: TxHash,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to report deployed contract address")]
    Report(#[from] std::io::Error),
}

/// Handle for a deployment transaction that was accepted by the node but is
/// not mined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeployment {
    pub tx_hash: TxHash,
}

/// A deployment whose transaction has been mined successfully.
///
/// Only obtainable through [`Deployer::await_confirmation`], so holding one
/// means the contract exists on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedDeployment {
    address: Address,
    tx_hash: TxHash,
    block_number: Option<u64>,
}

impl ConfirmedDeployment {
    pub fn new(address: Address, tx_hash: TxHash, block_number: Option<u64>) -> Self {
        Self {
            address,
            tx_hash,
            block_number,
        }
    }

    /// Address of the deployed contract.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }
}

/// Abstracts the deployment capabilities of an Ethereum toolchain.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Deployer: Send + Sync {
    /// Finds the compiled artifact of the named contract and turns it into a
    /// factory able to deploy it.
    ///
    /// `name` is either a bare contract name or a fully qualified one
    /// (`contracts/Greeter.sol:Greeter`).
    async fn resolve_factory(&self, name: &str) -> Result<Factory, DeployError>;

    /// Submits a contract creation transaction using `args` as constructor
    /// arguments. Returns as soon as the node accepted the transaction.
    async fn deploy(
        &self,
        factory: &Factory,
        args: &[String],
    ) -> Result<PendingDeployment, DeployError>;

    /// Waits until the deployment transaction is mined and checks that it
    /// created a contract.
    async fn await_confirmation(
        &self,
        pending: PendingDeployment,
    ) -> Result<ConfirmedDeployment, DeployError>;
}
