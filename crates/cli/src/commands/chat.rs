use crate::runtime::{retriever, Settings};
use crate::{AskArgs, ChatArgs};
use anyhow::{bail, Context, Result};
use console::style;
use kale_chat::{
    load_system_prompt, ChatConfig, ChatSession, NavigationBridge, OpenAiChatProvider, Page,
    TurnOutcome,
};
use kale_search::Retriever;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

struct ChatRuntime {
    session: ChatSession,
    retriever: Retriever,
    provider: OpenAiChatProvider,
}

/// Resolve every configuration error before the first turn.
async fn prepare(settings: &Settings, args: ChatArgs) -> Result<ChatRuntime> {
    let mut config = ChatConfig::from_env().context("read chat configuration")?;
    if let Some(prompt) = args.prompt {
        config.system_prompt_path = prompt;
    }
    if let Some(model) = args.model {
        config.model = model;
    }

    let system_prompt = load_system_prompt(&config.system_prompt_path)?;
    let provider = OpenAiChatProvider::new(config.openai()?)?;
    let retriever = retriever(settings, config.retrieval_timeout).await?;
    let session = ChatSession::new(system_prompt)
        .with_policy(config.context_policy)
        .with_top_k(config.top_k)
        .with_stream_timeout(config.stream_timeout);
    log::info!(
        "Chat ready: model {}, {} records in '{}'",
        config.model,
        retriever.collection().len(),
        settings.collection
    );

    Ok(ChatRuntime {
        session,
        retriever,
        provider,
    })
}

async fn turn(runtime: &mut ChatRuntime, text: &str) -> Result<TurnOutcome> {
    let mut stdout = std::io::stdout();
    let outcome = runtime
        .session
        .run_turn(text, &runtime.retriever, &runtime.provider, |delta| {
            print!("{delta}");
            let _ = stdout.flush();
        })
        .await;
    println!();
    Ok(outcome?)
}

fn render_outcome(outcome: &TurnOutcome) {
    if let Some(err) = &outcome.truncated {
        eprintln!("{} reply cut short: {err}", style("warning:").yellow().bold());
    }
    for (pos, action) in outcome.actions.iter().enumerate() {
        println!(
            "  {} {}",
            style(format!("[{}]", pos + 1)).cyan().bold(),
            action.label
        );
    }
}

pub(crate) async fn run_ask(settings: &Settings, args: AskArgs) -> Result<()> {
    let mut runtime = prepare(settings, args.chat).await?;
    let outcome = turn(&mut runtime, &args.question).await?;
    render_outcome(&outcome);
    Ok(())
}

pub(crate) async fn run_repl(settings: &Settings, args: ChatArgs) -> Result<()> {
    let mut runtime = prepare(settings, args).await?;
    println!(
        "{} Ask about PyKale. Commands: /go N, /page, /history, /quit",
        style("PyKale Assistant").green().bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").bold());
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await.context("read stdin")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match parse_command(input) {
            Some(ReplCommand::Quit) => break,
            Some(ReplCommand::Page) => {
                let page = runtime.session.navigator().current_page();
                println!("{} ({})", page.title(), page.id());
            }
            Some(ReplCommand::History) => {
                for message in runtime.session.store().visible_messages() {
                    println!(
                        "{}: {}",
                        style(format!("{:?}", message.role).to_lowercase()).bold(),
                        kale_chat::strip_tokens(&message.content)
                    );
                }
            }
            Some(ReplCommand::Go(n)) => match go(&mut runtime.session, n) {
                Ok(page) => println!("Now on {} ({})", page.title(), page.id()),
                Err(err) => eprintln!("{} {err}", style("error:").red().bold()),
            },
            Some(ReplCommand::Unknown(cmd)) => {
                eprintln!("{} unknown command {cmd}", style("error:").red().bold());
            }
            None => match turn(&mut runtime, input).await {
                Ok(outcome) => render_outcome(&outcome),
                Err(err) => {
                    let fatal = err
                        .downcast_ref::<kale_chat::ChatError>()
                        .is_some_and(kale_chat::ChatError::is_fatal);
                    if fatal {
                        return Err(err);
                    }
                    eprintln!("{} {err:#}", style("error:").red().bold());
                }
            },
        }
    }
    Ok(())
}

fn go(session: &mut ChatSession, n: usize) -> Result<Page> {
    if n == 0 {
        bail!("actions are numbered from 1");
    }
    match session.follow_action(n - 1) {
        Some(action) => Ok(action.page),
        None => bail!("no action [{n}] in the last reply"),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Quit,
    Page,
    History,
    Go(usize),
    Unknown(String),
}

fn parse_command(input: &str) -> Option<ReplCommand> {
    let rest = input.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    Some(match name {
        "quit" | "exit" | "q" => ReplCommand::Quit,
        "page" => ReplCommand::Page,
        "history" => ReplCommand::History,
        "go" => match parts.next().and_then(|n| n.parse().ok()) {
            Some(n) => ReplCommand::Go(n),
            None => ReplCommand::Unknown(input.to_string()),
        },
        _ => ReplCommand::Unknown(input.to_string()),
    })
}
