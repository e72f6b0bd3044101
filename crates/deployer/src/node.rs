//! [`Deployer`] backed by an Ethereum node reachable over JSON-RPC.

use {
    crate::{
        artifact::{ArtifactStore, Factory},
        traits::{ConfirmedDeployment, DeployError, Deployer, PendingDeployment},
    },
    alloy::{
        network::{EthereumWallet, TransactionBuilder},
        primitives::Address,
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result, ensure},
    std::{path::PathBuf, time::Duration},
    url::Url,
};

#[derive(Clone)]
pub struct Config {
    pub node_url: Url,
    /// Signs the deployment locally. Without it the first account managed by
    /// the node sends the transaction.
    pub signer: Option<PrivateKeySigner>,
    pub artifacts: PathBuf,
    /// Number of blocks, including the one with the transaction, to wait for.
    pub confirmations: u64,
    /// Give up waiting for the receipt after this long.
    pub confirmation_timeout: Option<Duration>,
}

pub struct NodeDeployer {
    provider: DynProvider,
    sender: Option<Address>,
    artifacts: ArtifactStore,
    confirmations: u64,
    confirmation_timeout: Option<Duration>,
}

impl NodeDeployer {
    pub fn new(config: Config) -> Self {
        // Nonce, gas and chain id are filled in by the provider's recommended
        // fillers.
        let (provider, sender) = match config.signer {
            Some(signer) => {
                let sender = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::new(signer))
                    .connect_http(config.node_url)
                    .erased();
                (provider, Some(sender))
            }
            None => (
                ProviderBuilder::new()
                    .connect_http(config.node_url)
                    .erased(),
                None,
            ),
        };

        Self {
            provider,
            sender,
            artifacts: ArtifactStore::new(config.artifacts),
            confirmations: config.confirmations,
            confirmation_timeout: config.confirmation_timeout,
        }
    }

    async fn sender(&self) -> Result<Address> {
        if let Some(sender) = self.sender {
            return Ok(sender);
        }
        let accounts = self
            .provider
            .get_accounts()
            .await
            .context("failed to query accounts managed by the node")?;
        accounts.first().copied().context(
            "no signer available: no private key configured and the node manages no accounts",
        )
    }

    async fn submit(&self, factory: &Factory, args: &[String]) -> Result<PendingDeployment> {
        let code = factory.deploy_code(args)?;
        let sender = self.sender().await?;
        tracing::debug!(?sender, contract = %factory.fully_qualified_name(), "sending deployment");

        let tx = TransactionRequest::default()
            .from(sender)
            .with_deploy_code(code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .context("node rejected the deployment transaction")?;
        Ok(PendingDeployment {
            tx_hash: *pending.tx_hash(),
        })
    }

    async fn confirm(&self, pending: PendingDeployment) -> Result<ConfirmedDeployment> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), pending.tx_hash)
            .with_required_confirmations(self.confirmations)
            .with_timeout(self.confirmation_timeout)
            .get_receipt()
            .await
            .context("failed to get deployment receipt")?;

        ensure!(
            receipt.status(),
            "deployment transaction reverted in block {:?}",
            receipt.block_number
        );
        let address = receipt
            .contract_address
            .context("receipt does not contain a contract address")?;
        Ok(ConfirmedDeployment::new(
            address,
            pending.tx_hash,
            receipt.block_number,
        ))
    }
}

#[async_trait::async_trait]
impl Deployer for NodeDeployer {
    async fn resolve_factory(&self, name: &str) -> Result<Factory, DeployError> {
        self.artifacts
            .resolve(name)
            .map_err(|source| DeployError::FactoryResolution {
                contract: name.to_owned(),
                source,
            })
    }

    async fn deploy(
        &self,
        factory: &Factory,
        args: &[String],
    ) -> Result<PendingDeployment, DeployError> {
        self.submit(factory, args)
            .await
            .map_err(DeployError::DeploymentSubmission)
    }

    async fn await_confirmation(
        &self,
        pending: PendingDeployment,
    ) -> Result<ConfirmedDeployment, DeployError> {
        self.confirm(pending)
            .await
            .map_err(|source| DeployError::Confirmation {
                tx_hash: pending.tx_hash,
                source,
            })
    }
}
