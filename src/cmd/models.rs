use crate::error::AppResult;
use crate::services::TicketService;

pub async fn run(service: &dyn TicketService) -> AppResult<()> {
    let models = service.check_models().await?;
    if models.is_empty() {
        println!("The provider returned no models for this key.");
        return Ok(());
    }
    println!("Available models ({}):", models.len());
    for model in models {
        println!("  {model}");
    }
    Ok(())
}
