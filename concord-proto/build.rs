fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .out_dir("src")
        .compile_protos(&["proto/federation.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/federation.proto");

    Ok(())
}
