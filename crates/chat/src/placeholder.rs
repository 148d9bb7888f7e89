use crate::page::Page;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Navigation placeholders the model may emit in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NavToken {
    Home,
    Hub,
    VideoExample,
    DomainAdaptation,
    Introduction,
    KaleApi,
    ChatbotPage,
    LoaddataPage,
    PrepdataPage,
    EmbedPage,
    PredictPage,
    EvaluatePage,
    InterpretPage,
    PipelinePage,
    BuildFirstModelPage,
}

struct TokenEntry {
    token: NavToken,
    placeholder: &'static str,
    label: &'static str,
    page: Page,
}

// Indexed by `NavToken as usize`.
#[rustfmt::skip]
static TOKEN_TABLE: [TokenEntry; 15] = [
    TokenEntry { token: NavToken::Home, placeholder: "[HOME_LINK]", label: "Home Page", page: Page::Home },
    TokenEntry { token: NavToken::Hub, placeholder: "[HUB_LINK]", label: "Hub Page", page: Page::Hub },
    TokenEntry { token: NavToken::VideoExample, placeholder: "[VIDEO_EXAMPLE_LINK]", label: "Video Demo", page: Page::VideoExample },
    TokenEntry { token: NavToken::DomainAdaptation, placeholder: "[DOMAIN_ADAPTATION_LINK]", label: "Domain Adaptation", page: Page::DomainAdaptation },
    TokenEntry { token: NavToken::Introduction, placeholder: "[INTRODUCTION_LINK]", label: "Introduction", page: Page::Introduction },
    TokenEntry { token: NavToken::KaleApi, placeholder: "[KALE_API_LINK]", label: "Kale API Guide", page: Page::KaleApi },
    TokenEntry { token: NavToken::ChatbotPage, placeholder: "[CHATBOT_PAGE_LINK]", label: "Chatbot", page: Page::ChatbotPage },
    TokenEntry { token: NavToken::LoaddataPage, placeholder: "[LOADDATA_PAGE_LINK]", label: "Load Data", page: Page::LoaddataPage },
    TokenEntry { token: NavToken::PrepdataPage, placeholder: "[PREPDATA_PAGE_LINK]", label: "Prep Data", page: Page::PrepdataPage },
    TokenEntry { token: NavToken::EmbedPage, placeholder: "[EMBED_PAGE_LINK]", label: "Embed Page", page: Page::EmbedPage },
    TokenEntry { token: NavToken::PredictPage, placeholder: "[PREDICT_PAGE_LINK]", label: "Predict Page", page: Page::PredictPage },
    TokenEntry { token: NavToken::EvaluatePage, placeholder: "[EVALUATE_PAGE_LINK]", label: "Evaluate Page", page: Page::EvaluatePage },
    TokenEntry { token: NavToken::InterpretPage, placeholder: "[INTERPRET_PAGE_LINK]", label: "Interpret Page", page: Page::InterpretPage },
    TokenEntry { token: NavToken::PipelinePage, placeholder: "[PIPELINE_PAGE_LINK]", label: "Pipeline Page", page: Page::PipelinePage },
    TokenEntry { token: NavToken::BuildFirstModelPage, placeholder: "[BUILD_FIRST_MODEL_PAGE_LINK]", label: "Build First Model", page: Page::BuildFirstModelPage },
];

static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[A-Z0-9_]+\]").unwrap_or_else(|err| panic!("placeholder pattern: {err}"))
});

impl NavToken {
    pub fn all() -> impl Iterator<Item = NavToken> {
        TOKEN_TABLE.iter().map(|entry| entry.token)
    }

    fn entry(self) -> &'static TokenEntry {
        &TOKEN_TABLE[self as usize]
    }

    #[must_use]
    pub fn placeholder(self) -> &'static str {
        self.entry().placeholder
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.entry().label
    }

    #[must_use]
    pub fn page(self) -> Page {
        self.entry().page
    }

    #[must_use]
    pub fn from_placeholder(text: &str) -> Option<Self> {
        TOKEN_TABLE
            .iter()
            .find(|entry| entry.placeholder == text)
            .map(|entry| entry.token)
    }
}

/// Remove every known placeholder; unknown bracketed text is left alone.
///
/// Removal repeats until nothing changes, so a placeholder assembled by an
/// inner removal is removed too and the result is a fixed point.
#[must_use]
pub fn strip_tokens(text: &str) -> String {
    resolve(text).0
}

/// Tokens removed by [`strip_tokens`], each at most once, in table order.
///
/// `"[HOME_[HUB_LINK]LINK]"` triggers both `Hub` and the `Home` link that
/// stripping `[HUB_LINK]` leaves behind.
#[must_use]
pub fn find_triggered_tokens(text: &str) -> Vec<NavToken> {
    let mut found = resolve(text).1;
    found.sort_unstable();
    found.dedup();
    found
}

fn resolve(text: &str) -> (String, Vec<NavToken>) {
    let mut found = Vec::new();
    let mut current = text.to_string();
    while let Some(next) = strip_pass(&current, &mut found) {
        current = next;
    }
    (current, found)
}

/// One removal pass. `None` when no known placeholder was present.
fn strip_pass(text: &str, found: &mut Vec<NavToken>) -> Option<String> {
    let mut removed = false;
    let next = BRACKETED.replace_all(text, |caps: &Captures<'_>| {
        match NavToken::from_placeholder(&caps[0]) {
            Some(token) => {
                found.push(token);
                removed = true;
                String::new()
            }
            None => caps[0].to_string(),
        }
    });
    removed.then(|| next.into_owned())
}
