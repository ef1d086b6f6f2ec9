//! Main binary entry point for the castfix rewriting tool.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so that it behaves exactly like the `castfix` binary of the `castfix-cli` crate.

use anyhow::Result;

fn main() -> Result<()> {
    let code = castfix::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
