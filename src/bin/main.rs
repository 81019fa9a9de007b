use wikidata_bots::command_line::command_line_usage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();
    command_line_usage().await?;
    Ok(())
}
