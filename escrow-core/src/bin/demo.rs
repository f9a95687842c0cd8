//! Deal lifecycle demo binary
//!
//! Runs one full deal against the captured notification payload: fund the
//! target, verify the publication, sell one access, withdraw the proceeds.

use escrow_core::{spawn_deal_actor, Address, Config, DealEngine, TokenAmount};
use escrow_core::{CBOR_CODEC, DEAL_PUBLISHED_METHOD_NUM};

// Captured deal-published notification payload
const PAYLOAD_HEX: &str = "8240584c8bd82a5828000181e2039220206b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b190800f4420068420066656c6162656c0a1a0008ca0a42000a42000a42000a";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting deal demo");

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let engine = DealEngine::from_config(&config)?;
    let handle = spawn_deal_actor(engine);

    let investor_a = Address::from_hex("0x00a1")?;
    let investor_b = Address::from_hex("0x00a2")?;
    let buyer = Address::from_hex("0x00b1")?;
    let bridge = Address::from_hex(&config.deal.notification_source)?;
    let target = TokenAmount::new(u128::from(config.deal.initial_investment_target));
    let price = TokenAmount::new(u128::from(config.deal.purchase_price));
    let half = TokenAmount::new(target.units() / 2);

    // Fund the target from two investors
    let outcome = handle.invest(investor_a.clone(), half).await?;
    tracing::info!(state = %outcome.state, "investor A funded");
    let rest = target.checked_sub(half).unwrap_or(TokenAmount::ZERO);
    let outcome = handle.invest(investor_b.clone(), rest).await?;
    tracing::info!(state = %outcome.state, "investor B funded");

    // Deliver the captured publication notification
    let payload = hex::decode(PAYLOAD_HEX)?;
    let proposal = handle
        .handle_filecoin_method(bridge, DEAL_PUBLISHED_METHOD_NUM, CBOR_CODEC, payload)
        .await?;
    tracing::info!(
        provider = %proposal.provider,
        piece_size = proposal.piece_size,
        duration = proposal.duration(),
        "publication verified"
    );

    // Sell one access and pay everyone out
    let outcome = handle.purchase(buyer, price).await?;
    tracing::info!(
        payouts = outcome.payouts.len(),
        remainder = %outcome.remainder,
        "access sold"
    );
    for investor in [investor_a, investor_b] {
        let amount = handle.withdraw(investor.clone()).await?;
        tracing::info!(investor = %investor, amount = %amount, "proceeds withdrawn");
    }

    handle.shutdown().await?;
    tracing::info!("Deal demo complete");
    Ok(())
}
