//! Redline
//!
//! Headless review session: indexes a sample outline, drafts and saves a few
//! annotations against a simulated viewer, scrolls to one of them and prints
//! the stored annotations as JSON.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redline::annotations::{Annotation, AnnotationType};
use redline::events::{EventLog, ReviewEvent};
use redline::geometry::{PageSize, PixelRect};
use redline::outline::{DestinationKind, OutlineDest, OutlineNode, RawDestination};
use redline::overlay::DraftSubmission;
use redline::scroll::ScrollOutcome;
use redline::store::{AnnotationStore, MemoryAnnotationStore, SqliteAnnotationStore};
use redline::surface::{SelectionEvent, SimulatedDocument, SimulatedViewer};
use redline::{Config, ReviewSession};

const DOCUMENT_ID: &str = "sample-paper";
const PAGE_COUNT: u32 = 24;
const PAGE_HEIGHT_PT: f64 = 792.0;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    annotations: Vec<Annotation>,
    scroll: ScrollOutcome,
    events: Vec<ReviewEvent>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "redline=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Redline v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn AnnotationStore> = match &config.database.url {
        Some(url) => {
            tracing::info!("Database: {}", url);
            Arc::new(
                SqliteAnnotationStore::connect(url)
                    .await
                    .context("Failed to open annotation database")?,
            )
        }
        None => {
            tracing::info!("Database: in-memory");
            Arc::new(MemoryAnnotationStore::new())
        }
    };

    let page = PageSize::new(612.0, PAGE_HEIGHT_PT);
    let viewer = Arc::new(
        SimulatedViewer::uniform(PAGE_COUNT, page).with_render_delay(config.review.scroll.retry_policy().interval * 2),
    );
    let document = sample_document();
    let events = Arc::new(EventLog::new());

    let mut session = ReviewSession::new(config.review.clone(), store, viewer.clone(), events.clone());
    session.load_document(DOCUMENT_ID, document.outline(), &document).await?;

    for page_number in 1..=3 {
        if let Some(layout) = viewer.render_page(page_number) {
            session.page_rendered(layout.page_number, layout.size);
        }
    }
    session.on_animation_frame();

    let drafts = [
        (1, 120.0, 150.0, "Define the review scope earlier.", AnnotationType::Comment),
        (2, 420.0, 450.0, "\"significant\" needs a p-value.", AnnotationType::Edit),
        (3, 640.0, 700.0, "Is this figure still current?", AnnotationType::Discussion),
    ];

    let mut saved = Vec::new();
    for (page_number, y1, y2, comment, annotation_type) in drafts {
        let proposal = session.select(&selection(page, page_number, y1, y2))?;
        tracing::info!(
            page_number,
            section = %proposal.suggested_section,
            "Draft proposed"
        );

        let annotation = session
            .submit(DraftSubmission {
                comment_text: comment.to_string(),
                annotation_type,
                section_label: Some(proposal.suggested_section),
                author_id: "reviewer".to_string(),
                ..Default::default()
            })
            .await?;
        saved.push(annotation);
    }

    // Page 3 scrolls out of view before navigating back to its annotation
    viewer.unrender_page(3);
    session.page_removed(3);
    session.on_animation_frame();

    let target = saved.last().map(|a| a.id).context("No annotation was saved")?;
    let scroll = session.scroll_to_annotation(target).await;
    for layout in viewer.settle() {
        session.page_rendered(layout.page_number, layout.size);
    }
    session.on_animation_frame();

    let annotations = session.engine().annotations().to_vec();
    let report = Report {
        annotations,
        scroll,
        events: events.drain(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn sample_document() -> SimulatedDocument {
    let xyz = |page: u32, top: f64| {
        OutlineDest::Explicit(RawDestination::new(
            SimulatedDocument::page_ref(page),
            DestinationKind::Xyz,
            vec![Some(0.0), Some(top), None],
        ))
    };
    let fit_h = |page: u32, top: f64| {
        OutlineDest::Explicit(RawDestination::new(
            SimulatedDocument::page_ref(page),
            DestinationKind::FitH,
            vec![Some(top)],
        ))
    };

    SimulatedDocument::new(vec![PAGE_HEIGHT_PT; PAGE_COUNT as usize])
        .with_named("results", RawDestination::new(SimulatedDocument::page_ref(3), DestinationKind::Fit, vec![]))
        .with_outline(vec![
            OutlineNode::new("Abstract").with_dest(xyz(1, PAGE_HEIGHT_PT)),
            OutlineNode::new("1 Introduction").with_dest(xyz(1, 400.0)),
            OutlineNode::new("2 Method").with_dest(fit_h(2, 500.0)).with_children(vec![
                OutlineNode::new("2.1 Data").with_dest(fit_h(2, 250.0)),
            ]),
            OutlineNode::new("3 Results").with_dest(OutlineDest::Named("results".to_string())),
            OutlineNode::new("Appendix").with_dest(OutlineDest::Named("appendix".to_string())),
        ])
}

fn selection(page: PageSize, page_number: u32, y1: f64, y2: f64) -> SelectionEvent {
    SelectionEvent {
        rect: PixelRect {
            x1: 72.0,
            y1,
            x2: page.width_px - 72.0,
            y2,
            page_width_px: page.width_px,
            page_height_px: page.height_px,
            page_number,
        },
        text: String::new(),
    }
}
