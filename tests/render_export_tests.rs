mod support;

use factor_dash::api::{Chart, Dashboard};
use factor_dash::core::Viewport;
use factor_dash::render::{export_frame, ExportFormat, NullRenderer, PdfRenderer, Renderer};
use factor_dash::AppOptions;
use support::pca_model;

fn session() -> factor_dash::Session {
    Dashboard::pca(pca_model(), AppOptions::default())
        .expect("dashboard")
        .session()
        .expect("session")
}

#[test]
fn factor_map_frame_validates_and_reaches_the_renderer() {
    let session = session();
    let chart = session.chart("map.ind.plot").expect("map");
    let frame = chart.to_render_frame(Viewport::new(900, 600)).expect("frame");
    frame.validate().expect("valid frame");

    let mut renderer = NullRenderer::default();
    renderer.render(&frame).expect("render");
    assert!(renderer.last_stats.circles_drawn >= 5);
    assert!(renderer.last_stats.texts_drawn >= 5, "point labels and title");
}

#[test]
fn variables_map_draws_the_unit_circle_and_arrows() {
    let session = session();
    let chart = session.chart("map.var.plot").expect("map");
    let frame = chart.to_render_frame(Viewport::default()).expect("frame");
    assert!(frame.lines.len() >= 3, "one shaft per variable");
}

#[test]
fn empty_chart_still_renders_its_title() {
    let frame = Chart::empty("Nothing to show")
        .to_render_frame(Viewport::new(400, 300))
        .expect("frame");
    assert!(frame.texts.iter().any(|text| text.text == "Nothing to show"));
}

#[test]
fn zero_sized_viewport_is_rejected() {
    assert!(Chart::empty("t").to_render_frame(Viewport::new(0, 300)).is_err());
}

#[test]
fn exports_carry_the_expected_file_signatures() {
    let session = session();

    let svg = session.export_chart("map.ind.plot", ExportFormat::Svg).expect("svg");
    let text = String::from_utf8(svg).expect("utf8 svg");
    assert!(text.contains("<svg"));
    assert!(text.contains("ind1"));

    let png = session.export_chart("map.ind.plot", ExportFormat::Png).expect("png");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let jpeg = session.export_chart("eig.scree", ExportFormat::Jpeg).expect("jpeg");
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let pdf = session.export_chart("map.ind.plot", ExportFormat::Pdf).expect("pdf");
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn pdf_export_draws_markers_and_text_without_a_font_file() {
    let session = session();
    let chart = session.chart("map.ind.plot").expect("map");
    let frame = chart.to_render_frame(Viewport::new(900, 600)).expect("frame");

    let mut renderer = PdfRenderer::new();
    renderer.render(&frame).expect("render");
    assert!(renderer.last_stats().circles_drawn >= 5);
    assert_eq!(renderer.last_stats().texts_drawn, frame.texts.len());
    assert_eq!(renderer.last_stats().texts_skipped, 0);
}

#[test]
fn export_formats_resolve_from_their_extensions() {
    for format in ExportFormat::ALL {
        assert_eq!(ExportFormat::from_extension(format.extension()).expect("known"), format);
    }
    assert_eq!(ExportFormat::from_extension("PDF").expect("pdf"), ExportFormat::Pdf);
    assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
    assert!(ExportFormat::from_extension("tiff").is_err());
}

#[test]
fn export_file_names_carry_kind_output_and_extension() {
    let session = session();
    let name = session.export_file_name("map.ind.plot", ExportFormat::Jpeg);
    assert!(name.starts_with("pca-map.ind.plot-"));
    assert!(name.ends_with(".jpg"));
}

#[test]
fn table_outputs_cannot_be_exported() {
    let session = session();
    assert!(session.export_chart("eig.table", ExportFormat::Svg).is_err());
}

#[test]
fn bar_chart_frame_draws_one_rect_per_bar() {
    let session = session();
    let chart = session.chart("values.ind.contrib.bar").expect("bar");
    let frame = chart.to_render_frame(Viewport::default()).expect("frame");
    assert!(frame.rects.len() >= chart.bars().len());
    let direct = export_frame(&frame, ExportFormat::Svg).expect("svg");
    assert!(!direct.is_empty());
}
