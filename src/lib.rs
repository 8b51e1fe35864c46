mod classify;
mod error;
mod fonts;
mod generator;
mod model;
mod pdf;
mod plan;
mod service;
mod style;
mod templates;

pub use classify::{RULES, Rule, classify, classify_chunk};
pub use error::Error;
pub use fonts::FontSet;
pub use generator::{DocumentGenerator, DocumentHandle, check_complete};
pub use model::{
    Block, BlockKind, FieldKind, FieldSpec, FilledFields, PageGeometry, PartyEntry,
    TemplateDescriptor, parties_from_fields,
};
pub use pdf::{
    Cover, PdfBackend, RenderBackend, TableRequest, decorate, layout, page_label, wrap_text,
};
pub use plan::{DrawOp, FontVariant, LayoutPlan, Page, TableOp, TextStyle};
pub use service::{OfflineService, ServiceError, StaticTextService, TemplateService};
pub use style::LayoutStyle;
pub use templates::{
    BuiltinTemplateSource, RemoteTemplateSource, TemplateRegistry, TemplateSource,
    builtin_templates,
};

use std::time::Instant;

/// Classify, lay out and decorate one generated document. `text` must already
/// have passed [`check_complete`].
pub fn compose(
    text: &str,
    template: &TemplateDescriptor,
    fields: &FilledFields,
    effective_date: &str,
    style: &LayoutStyle,
    backend: &dyn RenderBackend,
) -> LayoutPlan {
    let t0 = Instant::now();

    let blocks = classify(text);
    let t_classify = t0.elapsed();

    let parties = parties_from_fields(fields);
    let cover_title = template.display_name.to_uppercase();
    let cover = Cover {
        title: &cover_title,
        effective_date,
        parties: &parties,
    };
    let plan = layout(&blocks, &cover, style, backend);
    let t_layout = t0.elapsed();

    let plan = decorate(plan, &template.display_name, style, backend);
    let t_total = t0.elapsed();

    log::info!(
        "Timing: classify={:.1}ms, layout={:.1}ms, decorate={:.1}ms, total={:.1}ms ({} blocks, {} pages)",
        t_classify.as_secs_f64() * 1000.0,
        (t_layout - t_classify).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        blocks.len(),
        plan.page_count(),
    );

    plan
}
