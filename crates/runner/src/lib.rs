//! rflocal local runner
//!
//! Runs a remote, crowd-sourced test suite against a web app that only
//! exists on the developer's machine:
//! - Exposes the local app through a localtunnel client process
//! - Registers the tunnel URL as a temporary test environment
//! - Creates the run (or opens a test editor) against that environment
//! - Deletes the temporary environment however the run ends
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  LocalRunner                                             │
//! │    ├── resolve_tunnel_config() -> TunnelConfig           │
//! │    ├── open_tunnel(config) -> Box<dyn Tunnel>            │
//! │    ├── provision_environment(url) -> environment id      │
//! │    ├── build_run_params(ctx, id) -> RunParams            │
//! │    ├── start_run(ctx) -> RunStatus                       │
//! │    └── start_interactive_edit(ctx) -> edit URL           │
//! ├──────────────────────────────────────────────────────────┤
//! │  Collaborators (traits)                                  │
//! │    ├── TunnelProvider      (LocalTunnelProvider)         │
//! │    ├── EnvironmentClient   (HTTP client in the CLI)      │
//! │    ├── RunClient           (HTTP client in the CLI)      │
//! │    └── BrowserLauncher     (SystemBrowser)               │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod browsers;
pub mod config;
pub mod launcher;
pub mod monitor;
pub mod orchestrator;
pub mod tunnel;

pub use config::{RunnerConfig, TunnelConfig};
pub use launcher::{BrowserLauncher, SystemBrowser};
pub use orchestrator::{LocalRunContext, LocalRunner};
pub use tunnel::{LocalTunnelProvider, Tunnel, TunnelProvider};
