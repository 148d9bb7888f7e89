use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pages of the PyKale portal the assistant can send a user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Hub,
    ChatbotPage,
    TrainPage,
    VideoExample,
    DomainAdaptation,
    Introduction,
    KaleApi,
    LoaddataPage,
    PrepdataPage,
    EmbedPage,
    PredictPage,
    EvaluatePage,
    InterpretPage,
    PipelinePage,
    BuildFirstModelPage,
}

impl Page {
    pub const ALL: [Page; 16] = [
        Page::Home,
        Page::Hub,
        Page::ChatbotPage,
        Page::TrainPage,
        Page::VideoExample,
        Page::DomainAdaptation,
        Page::Introduction,
        Page::KaleApi,
        Page::LoaddataPage,
        Page::PrepdataPage,
        Page::EmbedPage,
        Page::PredictPage,
        Page::EvaluatePage,
        Page::InterpretPage,
        Page::PipelinePage,
        Page::BuildFirstModelPage,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Hub => "hub",
            Page::ChatbotPage => "chatbot_page",
            Page::TrainPage => "train_page",
            Page::VideoExample => "video_example",
            Page::DomainAdaptation => "domain_adaptation",
            Page::Introduction => "introduction",
            Page::KaleApi => "kale_api",
            Page::LoaddataPage => "loaddata_page",
            Page::PrepdataPage => "prepdata_page",
            Page::EmbedPage => "embed_page",
            Page::PredictPage => "predict_page",
            Page::EvaluatePage => "evaluate_page",
            Page::InterpretPage => "interpret_page",
            Page::PipelinePage => "pipeline_page",
            Page::BuildFirstModelPage => "build_first_model_page",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Hub => "Learning Hub",
            Page::ChatbotPage => "PyKale Assistant",
            Page::TrainPage => "No-Code Model Trainer",
            Page::VideoExample => "Video Loading Example",
            Page::DomainAdaptation => "Toy Domain Adaptation",
            Page::Introduction => "Introduction to PyKale",
            Page::KaleApi => "The KALE API Guide",
            Page::LoaddataPage => "Data Handling",
            Page::PrepdataPage => "Prepare Data",
            Page::EmbedPage => "Embed",
            Page::PredictPage => "Predict",
            Page::EvaluatePage => "Evaluate",
            Page::InterpretPage => "Model Interpretation",
            Page::PipelinePage => "Pipeline",
            Page::BuildFirstModelPage => "Build Your First PyKale Model",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Page {
    type Err = ChatError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Page::ALL
            .into_iter()
            .find(|page| page.id() == wanted)
            .ok_or_else(|| ChatError::InvalidConfig(format!("unknown page '{wanted}'")))
    }
}
