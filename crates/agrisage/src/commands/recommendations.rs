//! Recommendation command handlers.

use tabled::Tabled;

use agrisage_core::{Advisor, FarmId, Recommendation};

use crate::cli::{GlobalOpts, RecommendationsArgs, RecommendationsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn row(r: &Recommendation, color: bool) -> RecommendationRow {
    RecommendationRow {
        id: r.id.map(|id| id.to_string()).unwrap_or_default(),
        priority: output::paint_priority(r.priority, color),
        kind: r.kind.to_string(),
        status: r.status.to_string(),
        title: r.title.clone(),
        created: util::date_opt(r.created_at.as_ref()),
    }
}

pub async fn handle(
    advisor: &Advisor,
    args: RecommendationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RecommendationsCommand::List { farm } => {
            let recs = advisor.recommendations(FarmId::new(farm)).await?;
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                recs.as_slice(),
                |r| row(r, color),
                |r| r.id.map(|id| id.to_string()).unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
