use cucumber::given;

use crate::{
    cucumber::SettlementWorld,
    support::{SystemOptions, TestSystem},
};

#[given("a fresh install")]
async fn fresh_install(world: &mut SettlementWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given("a fresh install with payer email matching")]
async fn fresh_install_lenient(world: &mut SettlementWorld) {
    let options = SystemOptions { strict_mode: false, ..Default::default() };
    world.system = Some(TestSystem::with_options(options).await);
}
