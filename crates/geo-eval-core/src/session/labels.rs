//! Human-readable labels for backend operations

use crate::client::Language;

/// Maps backend operation names to progress messages
pub trait StageLabels: Send + Sync {
    /// Shown while the service sets up a phase
    fn initializing(&self, language: Language) -> String;

    /// Label for a named operation; unknown names should pass through
    fn label(&self, operation: &str, language: Language) -> String;
}

/// Built-in labels for the service's graph nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStageLabels;

impl StageLabels for DefaultStageLabels {
    fn initializing(&self, language: Language) -> String {
        match language {
            Language::EnUs => {
                "Setting up the language model and preparing the analysis environment..."
            }
            Language::PtBr => {
                "Configurando o modelo de linguagem e preparando o ambiente de análise..."
            }
        }
        .to_string()
    }

    fn label(&self, operation: &str, language: Language) -> String {
        let known = match (operation, language) {
            ("web_research", Language::EnUs) => "Researching web for company data",
            ("web_research", Language::PtBr) => "Pesquisando dados da empresa na web",
            ("get_keywords", Language::EnUs) => {
                "Extracting relevant keywords from your company information..."
            }
            ("get_keywords", Language::PtBr) => {
                "Extraindo palavras-chave relevantes das informações da sua empresa..."
            }
            ("refine_keywords", Language::EnUs) => "Refining chosen keywords",
            ("refine_keywords", Language::PtBr) => "Refinando as palavras-chave escolhidas",
            ("gather_results", Language::EnUs) => "Gathering citations for the chosen keywords...",
            ("gather_results", Language::PtBr) => {
                "Coletando citações para as palavras-chave escolhidas..."
            }
            _ => return operation.to_string(),
        };
        known.to_string()
    }
}
