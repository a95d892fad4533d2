use async_trait::async_trait;
use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment processor unavailable: {0}")]
    Unavailable(String),
}

/// Seam to the payment processor. Settlement calls `transfer` exactly
/// once per attempt; there is no retry on failure.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn transfer(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        amount: Decimal,
    ) -> Result<(), GatewayError>;
}

/// Simulated processor: debits the renter, credits the owner, keeps no
/// ledger. Stands in for a real gateway integration.
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn transfer(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        amount: Decimal,
    ) -> Result<(), GatewayError> {
        tracing::info!("Debiting {} from user {}", amount, from_user_id);
        tracing::info!("Crediting {} to user {}", amount, to_user_id);
        Ok(())
    }
}
