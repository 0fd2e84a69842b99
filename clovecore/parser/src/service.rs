use serde::{Serialize, Deserialize};

use clove_ast::{collect_aliases, collect_holes, verify_refs};

use crate::parse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiagnosticSeverity { Error, Warning }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: DiagnosticSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateDiagnostics {
    pub errors: Vec<Diagnostic>,
    pub holes: Vec<String>,
    pub aliases: Vec<String>,
}

pub fn analyze_template(source: &str) -> TemplateDiagnostics {
    let mut out = TemplateDiagnostics::default();
    match parse(source) {
        Ok(ast) => {
            if let Err(e) = verify_refs(&ast) {
                for msg in e.0.split("; ") {
                    out.errors.push(Diagnostic {
                        message: msg.to_string(),
                        severity: DiagnosticSeverity::Error,
                    });
                }
            }
            out.holes = collect_holes(&ast).into_iter().map(|h| h.name).collect();
            out.aliases = collect_aliases(&ast);
        }
        Err(e) => {
            out.errors.push(Diagnostic {
                message: format!("{}", e),
                severity: DiagnosticSeverity::Error,
            });
        }
    }
    out
}
