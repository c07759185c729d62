fn main() -> anyhow::Result<()> {
    hyprsnipper::run()?;
    Ok(())
}
