//! A terminal chat client built on `lingua`.
//!
//! Usage: `lingua [CONFIG]`. See [`lingua::settings`] for the settings
//! file and the environment variables it reads.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use lingua::settings::Settings;
use lingua::{
    Agent, AgentBuilder, Attachment, Context, FileUpload, HttpTransport,
    Image, Response, upload_file,
};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::signal;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

const HELP: &str = "\
/image <path|url>  attach an image to the next message
/file <path>       upload a file and attach it to the next message
/system <text>     replace the system prompt
/reset             forget the conversation
/quit              exit";

enum Command<'a> {
    Message(&'a str),
    Image(&'a str),
    File(&'a str),
    System(&'a str),
    Reset,
    Help,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Message(line));
        };
        let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let arg = arg.trim();
        match name {
            "image" if !arg.is_empty() => Some(Self::Image(arg)),
            "file" if !arg.is_empty() => Some(Self::File(arg)),
            "system" if !arg.is_empty() => Some(Self::System(arg)),
            "reset" => Some(Self::Reset),
            "help" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = env::args_os().nth(1).map(PathBuf::from);
    let settings = match Settings::load(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("loaded settings: {settings:?}");

    let provider = match settings.provider() {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let transport = match HttpTransport::new(&settings.transport_config()) {
        Ok(transport) => Arc::new(transport),
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    let mut builder = AgentBuilder::with_provider(provider)
        .with_shared_transport(transport.clone())
        .with_options(settings.options.clone())
        .with_window(settings.window());
    if let Some(system_prompt) = &settings.system_prompt {
        builder = builder.with_system_prompt(system_prompt.as_str());
    }
    let mut agent = match builder.build() {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let mut pending: Vec<Attachment> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(command) = Command::parse(line) else {
            println!("{HELP}");
            continue;
        };
        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Reset => {
                agent.reset();
                pending.clear();
                notice("conversation cleared");
            }
            Command::System(text) => {
                agent.set_system_prompt(text);
                notice("system prompt updated");
            }
            Command::Image(source) => match load_image(source).await {
                Ok(image) => {
                    pending.push(image.into());
                    notice(&format!("attached {source}"));
                }
                Err(err) => failure(&err),
            },
            Command::File(path) => {
                let ctx = Context::background();
                let result = async {
                    let upload = FileUpload::from_path(path).await?;
                    upload_file(&ctx, transport.as_ref(), agent.provider(), &upload)
                        .await
                }
                .await;
                match result {
                    Ok(file) => {
                        notice(&format!("uploaded {} as {}", file.filename, file.id));
                        pending.push(file.into());
                    }
                    Err(err) => failure(&err),
                }
            }
            Command::Message(text) => {
                let result =
                    run_turn(&mut agent, text, pending.clone(), &progress_style)
                        .await;
                match result {
                    Ok(response) => {
                        pending.clear();
                        print_response(&response);
                    }
                    Err(err) => failure(&err),
                }
            }
        }
    }
}

/// Runs one turn with a spinner. Ctrl-C cancels the turn.
async fn run_turn(
    agent: &mut Agent,
    text: &str,
    attachments: Vec<Attachment>,
    progress_style: &ProgressStyle,
) -> lingua::Result<Response> {
    let ctx = Context::background();
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style.clone());
    progress_bar.set_message("🤔 Thinking...");

    let chat = agent.chat(&ctx, text, attachments);
    tokio::pin!(chat);
    let result = loop {
        progress_bar.inc(1);
        select! {
            result = &mut chat => break result,
            _ = signal::ctrl_c() => {
                debug!("cancelling the turn");
                ctx.cancel();
            }
            _ = sleep(Duration::from_millis(100)) => {}
        }
    };

    // Finish the progress bar before printing anything else.
    progress_bar.finish_and_clear();
    result
}

async fn load_image(source: &str) -> lingua::Result<Image> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(Image::from_url(source));
    }
    let upload = FileUpload::from_path(source).await?;
    Ok(Image::from_bytes(upload.data, upload.mime_type))
}

fn print_response(response: &Response) {
    let bar = BAR_CHAR.bright_cyan();
    if !response.text.is_empty() {
        println!("{bar}🤖 {}", response.text.bright_white());
    }
    for call in &response.tool_calls {
        println!(
            "{bar}🔧 {}({})",
            call.name.bright_white().bold(),
            call.arguments
        );
    }
    println!(
        "{bar}{}",
        format!(
            "{} in, {} out",
            response.tokens.input, response.tokens.output
        )
        .dimmed()
    );
    println!();
}

fn notice(message: &str) {
    println!("{}{}", BAR_CHAR.bright_green(), message.dimmed());
}

fn failure(err: &lingua::Error) {
    let bar = BAR_CHAR.bright_red();
    if err.is_cancelled() {
        println!("{bar}⏹  {}", err.to_string().bright_yellow());
    } else {
        println!("{bar}⚠️  {}", err.to_string().bright_red());
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(Command::parse("hello /there"), Some(Command::Message("hello /there"))));
        assert!(matches!(Command::parse("/image  cat.png "), Some(Command::Image("cat.png"))));
        assert!(matches!(
            Command::parse("/system Be brief."),
            Some(Command::System("Be brief."))
        ));
        assert!(Command::parse("/system").is_none());
        assert!(Command::parse("/system   ").is_none());
        assert!(matches!(Command::parse("/exit"), Some(Command::Quit)));
        assert!(Command::parse("/file").is_none());
        assert!(Command::parse("/unknown").is_none());
    }
}
