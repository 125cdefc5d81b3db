pub mod agent;
pub mod models;
pub mod server;
pub mod websocket;
pub mod config;
pub mod llm;
pub mod cli;
pub mod intent;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod templates;

use agent::PortfolioAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("client default"));
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("client default"));
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Knowledge Path: {}", args.knowledge_path.as_deref().unwrap_or("built-in"));
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Credential Store: {}", args.credential_store_path);
    info!("Max Message Length: {}", args.max_message_length);
    info!("-------------------------");

    let agent = Arc::new(PortfolioAgent::new(&args).await?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args.server_api_key.clone());
    server.run().await?;

    Ok(())
}
