use postiz_deploy::Pipeline;

fn main() -> anyhow::Result<()> {
    Pipeline::run()?;
    Ok(())
}
