//! Attribute Sync - Demo Entry Point
//!
//! Runs an authoritative host and one replica in the same process, connected
//! by an in-process channel transport. The host mutates a few entities,
//! persists them, and the replica's view is printed next to the host's.
//! Entity ids are fixed, so a second run restores the first run's state.

use attribute_sync::attributes::{
    InMemoryLiveAttributes, ModifierIdentityResolver, RefundPolicyRegistry,
};
use attribute_sync::core::error::Result;
use attribute_sync::core::{AttributeKey, EntityId, SyncConfig};
use attribute_sync::ecs::World;
use attribute_sync::persistence::JsonFileStore;
use attribute_sync::sync::{ChannelTransport, ObserverId, Role, SyncDispatcher};

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Host and replica attribute sync over an in-process transport
#[derive(Parser, Debug)]
#[command(name = "attribute-sync")]
#[command(about = "Replicate per-entity attribute overrides from a host to a replica")]
struct Args {
    /// TOML config with the attribute table and refund policies
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for persisted records (overrides the config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Number of entities to simulate
    #[arg(long, default_value_t = 3)]
    entities: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("attribute_sync=info")
        .init();

    let mut config = match &args.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    tracing::info!(
        attributes = config.attributes.len(),
        data_dir = %config.data_dir.display(),
        "attribute sync starting"
    );

    let rt = Runtime::new()?;

    let resolver = Arc::new(ModifierIdentityResolver::from_config(&config));
    let refunds = Arc::new(RefundPolicyRegistry::from_config(&config.refund));
    let transport = Arc::new(ChannelTransport::new());

    let host_live = Arc::new(InMemoryLiveAttributes::from_config(&config, resolver.clone()));
    let mut host = World::new(
        resolver.clone(),
        refunds.clone(),
        host_live.clone(),
        Arc::new(SyncDispatcher::new(transport.clone())),
    )
    .with_persistence(Arc::new(JsonFileStore::open(&config.data_dir)?));

    // The replica never sends, so its own transport has no peers
    let replica_live = Arc::new(InMemoryLiveAttributes::from_config(&config, resolver.clone()));
    let mut replica = World::new(
        resolver,
        refunds,
        replica_live.clone(),
        Arc::new(SyncDispatcher::new(Arc::new(ChannelTransport::new()))),
    );

    let observer = ObserverId::new();
    let inbox = transport.connect(observer);

    let level: AttributeKey = "level".parse()?;
    let strength: AttributeKey = "strength".parse()?;
    let luckiness: AttributeKey = "luckiness".parse()?;

    let entities: Vec<EntityId> = (0..args.entities)
        .map(|i| EntityId(Uuid::from_u128(u128::from(i) + 1)))
        .collect();

    for (i, entity) in entities.iter().copied().enumerate() {
        let store = host.track(entity, Role::Authoritative)?;
        let restored = !store.state().is_empty() || store.skill_points() != 0;

        let bump = i as f64 + 1.0;
        store.add(&level, bump);
        store.add(&strength, 2.0 * bump);
        store.set(&luckiness, 0.5 * bump);
        store.add_skill_points(3);
        let refunded = store.add_refund_points(10);

        tracing::info!(%entity, restored, refunded, "host mutated entity");
        host.attach_observer(entity, observer)?;
    }

    host.save_all()?;
    transport.disconnect(observer);

    let applied = rt.block_on(replica.run_replica(inbox));

    println!("\n=== ATTRIBUTE SYNC ===");
    println!("{} deltas applied on the replica\n", applied);
    for entity in &entities {
        let Some(authoritative) = host.store(*entity) else {
            continue;
        };
        println!("Entity {}", entity);
        println!(
            "  host:    {:?} skill={} refund={}",
            authoritative.state().entries(),
            authoritative.skill_points(),
            authoritative.refund_points()
        );
        match replica.store(*entity) {
            Some(mirror) => {
                println!(
                    "  replica: {:?} skill={} refund={}",
                    mirror.state().entries(),
                    mirror.skill_points(),
                    mirror.refund_points()
                );
                println!("  in sync: {}", mirror.state() == authoritative.state());
            }
            None => println!("  replica: <never received>"),
        }
        println!(
            "  live modifiers: host={} replica={}",
            host_live.modifier_count(*entity),
            replica_live.modifier_count(*entity)
        );
    }

    Ok(())
}
