use std::{fs, path::Path};

fn main() {
    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo");
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    fs::write(
        Path::new(&out_dir).join("default_workers"),
        (cores as u64).to_le_bytes(),
    )
    .expect("write default_workers");

    println!("cargo:rerun-if-changed=build.rs");
}
