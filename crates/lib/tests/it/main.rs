/*! Integration tests for Mapsync.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - object: Tests for ManagedObject resolution, lifecycle and change bridging
 * - collection: Tests for ManagedCollection membership, ordering and concurrency
 * - engine: Tests for the engine object model and the default interaction set
 * - scenarios: End-to-end node tree scenarios
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mapsync=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod engine;
mod helpers;
mod scenarios;
