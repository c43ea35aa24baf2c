fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile the proto file for the taste client
    tonic_build::compile_protos("../../proto/taste.proto")?;
    Ok(())
}
