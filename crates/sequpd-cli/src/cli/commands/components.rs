//! `sequpd components` – list configured components.

use crate::cli::context::RunContext;

pub fn run_components(ctx: &RunContext) {
    if ctx.cfg.components.is_empty() {
        println!("No components configured.");
        return;
    }
    println!("{:<34} {:<14} {}", "ID", "VERSION", "NAME");
    for c in &ctx.cfg.components {
        println!("{:<34} {:<14} {}", c.id, c.version, c.name);
    }
}
