#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    rube_flow::run_native()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
