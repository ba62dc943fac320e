use conference_gateway::utils::display::DisplayFormatter;
use conference_gateway::{ConferenceService, GatewayConfig, GatewayError, QueryParams, RequestGateway};
use serde_json::Value;
use std::error::Error;
use std::io::{self, Write};
use tracing::{debug, info};

const HELP: &str = "Commands:
  participants           - List participants
  programs               - List program sessions
  notifications          - List notifications
  stats                  - Show live statistics (never cached)
  dashboard <email>      - Show a participant dashboard
  get <path> [k=v ...]   - GET through the cache
  fresh <path> [k=v ...] - GET bypassing the cache
  post <path> <json>     - POST a JSON body
  put <path> <json>      - PUT a JSON body
  delete <path>          - DELETE a resource
  send <id>              - Send a participant's certificate
  send-all               - Send all certificates
  clear [path]           - Clear one cache entry, or the whole cache
  help                   - Show this list
  exit                   - Exit the program";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::from_env();
    info!("Starting conference gateway console ({})", config.environment);

    let gateway = RequestGateway::new(&config)?;
    let service = ConferenceService::new(gateway);
    let display = DisplayFormatter::new();

    println!("=== Conference Gateway ({}) ===", config.base_url);
    println!("{}", HELP);

    let mut input = String::new();
    loop {
        input.clear();
        print!("> ");
        io::stdout().flush()?;
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        debug!("Received command {} {}", command, rest);

        let (title, result) = match command {
            "exit" | "quit" => break,
            "help" => {
                println!("{}", HELP);
                continue;
            }
            "participants" => ("Participants".to_string(), service.participants().await),
            "programs" => ("Programs".to_string(), service.programs().await),
            "notifications" => ("Notifications".to_string(), service.notifications().await),
            "stats" => ("Statistics".to_string(), service.stats().await),
            "dashboard" if !rest.is_empty() => (
                format!("Dashboard for {}", rest),
                service.participant_dashboard(rest).await,
            ),
            "get" | "fresh" if !rest.is_empty() => {
                let (path, params) = parse_get_args(rest);
                let use_cache = command == "get";
                (path.to_string(), service.gateway().get(path, &params, use_cache).await)
            }
            "post" | "put" => match parse_body_args(rest) {
                Ok((path, body)) => {
                    let result = if command == "post" {
                        service.gateway().post(path, &body).await
                    } else {
                        service.gateway().put(path, &body).await
                    };
                    (format!("{} {}", command.to_uppercase(), path), result)
                }
                Err(message) => {
                    println!("{}", message);
                    continue;
                }
            },
            "delete" if !rest.is_empty() => (format!("DELETE {}", rest), service.gateway().delete(rest).await),
            "send" => match rest.parse::<u64>() {
                Ok(id) => (format!("Certificate for {}", id), service.send_certificate(id).await),
                Err(_) => {
                    println!("Usage: send <participant id>");
                    continue;
                }
            },
            "send-all" => ("Certificates".to_string(), service.send_all_certificates().await),
            "clear" => {
                let path = (!rest.is_empty()).then_some(rest);
                service.gateway().clear_cache(path, None);
                println!("Cache cleared ({} entries left)", service.gateway().cache().len());
                continue;
            }
            _ => {
                println!("Unknown command '{}'. Type 'help' for the command list.", line);
                continue;
            }
        };

        print_result(&display, &title, result);
    }

    info!("Shutting down");
    Ok(())
}

fn print_result(display: &DisplayFormatter, title: &str, result: Result<Value, GatewayError>) {
    match result {
        Ok(payload) => println!("{}", display.format_payload(title, &payload)),
        Err(e) => println!("{}", display.format_error(&e)),
    }
}

fn parse_get_args(args: &str) -> (&str, QueryParams) {
    let mut parts = args.split_whitespace();
    let path = parts.next().unwrap_or("/");
    let params = parts
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    (path, params)
}

fn parse_body_args(args: &str) -> Result<(&str, Value), String> {
    let (path, body) = args
        .split_once(char::is_whitespace)
        .ok_or_else(|| "Usage: post|put <path> <json>".to_string())?;
    let body = serde_json::from_str(body.trim()).map_err(|e| format!("Invalid JSON body: {}", e))?;
    Ok((path, body))
}
