use std::collections::HashMap;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::config::ExportConfig;

use super::diagram::Diagram;
use super::render::{BaseRenderer, CustomRenderer, DrawSurface, Paint, Primitive};
use super::types::{IconRef, SequenceFlow};

const ARROW_LENGTH: f32 = 11.0;
const ARROW_HALF_WIDTH: f32 = 5.0;
const LABEL_GAP: f32 = 4.0;

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Resolves icon hrefs, inlining files from a local directory when one is
/// configured. Missing files keep the plain href.
pub struct IconInliner {
    icon_dir: Option<PathBuf>,
    cache: HashMap<&'static str, Option<String>>,
}

impl IconInliner {
    pub fn new(icon_dir: Option<PathBuf>) -> Self {
        Self {
            icon_dir,
            cache: HashMap::new(),
        }
    }

    pub fn href(&mut self, icon: IconRef, fallback: &str) -> String {
        let Some(dir) = self.icon_dir.as_ref() else {
            return fallback.to_string();
        };

        let inlined = self.cache.entry(icon.file_name()).or_insert_with(|| {
            let path = dir.join(icon.file_name());
            match std::fs::read(&path) {
                Ok(bytes) => Some(format!(
                    "data:{};base64,{}",
                    mime_for(icon.file_name()),
                    BASE64.encode(bytes)
                )),
                Err(e) => {
                    log::warn!("Icon {} not inlined: {}", path.display(), e);
                    None
                }
            }
        });

        inlined.clone().unwrap_or_else(|| fallback.to_string())
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/svg+xml",
    }
}

/// Serialize one primitive, in the local space of its node group.
pub fn primitive_to_svg(primitive: &Primitive, icons: &mut IconInliner) -> String {
    match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            radius,
            paint,
        } => format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" ry="{}"{} />"#,
            x,
            y,
            width,
            height,
            radius,
            radius,
            paint_attrs(paint)
        ),
        Primitive::Circle { cx, cy, r, paint } => format!(
            r#"<circle cx="{}" cy="{}" r="{}"{} />"#,
            cx,
            cy,
            r,
            paint_attrs(paint)
        ),
        Primitive::Polygon { points, paint } => {
            let points = points
                .iter()
                .map(|(x, y)| format!("{},{}", x, y))
                .collect::<Vec<_>>()
                .join(" ");
            format!(r#"<polygon points="{}"{} />"#, points, paint_attrs(paint))
        }
        Primitive::Image {
            icon,
            href,
            x,
            y,
            width,
            height,
        } => format!(
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" />"#,
            escape_xml(&icons.href(*icon, href)),
            x,
            y,
            width,
            height
        ),
    }
}

fn paint_attrs(paint: &Paint) -> String {
    format!(
        r#" fill="{}" stroke="{}" stroke-width="{}""#,
        escape_xml(&paint.fill),
        escape_xml(&paint.stroke),
        paint.stroke_width
    )
}

/// Render the whole diagram as a standalone SVG document.
/// Returns the document with its width and height.
pub fn render_document<B: BaseRenderer>(
    diagram: &Diagram,
    renderer: &CustomRenderer<B>,
    export: &ExportConfig,
) -> (String, f32, f32) {
    let style = renderer.style();
    let pad = export.padding;

    let Some(bbox) = diagram.bounding_box() else {
        let (w, h) = (100.0 + pad * 2.0, 50.0 + pad * 2.0);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{bg}"/></svg>"#,
            bg = escape_xml(&style.background),
        );
        return (svg, w, h);
    };

    let label_room = style.font_size + LABEL_GAP * 2.0;
    let total_w = bbox.width + pad * 2.0;
    let total_h = bbox.height + pad * 2.0 + label_room;
    let mut icons = IconInliner::new(export.icon_dir.clone());
    let mut body = String::new();

    // Flows first so shapes sit on top of the line ends.
    for flow in diagram.flows() {
        body.push_str(&render_flow(diagram, flow, &style.flow_stroke));
    }

    for node in diagram.nodes() {
        let mut surface = DrawSurface::new();
        if renderer.can_render(node) {
            renderer.draw_shape(&mut surface, node);
        } else {
            renderer.base().draw_shape(&mut surface, node);
        }

        body.push_str(&format!(
            r#"<g data-element-id="{}" transform="translate({},{})">"#,
            escape_xml(&node.id),
            node.bounds.x,
            node.bounds.y
        ));
        for primitive in surface.primitives() {
            body.push_str(&primitive_to_svg(primitive, &mut icons));
        }
        body.push_str("</g>");

        if let Some(name) = node.name.as_deref() {
            let (cx, _) = node.bounds.center();
            body.push_str(&format!(
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-anchor="middle">{}</text>"#,
                cx,
                node.bounds.bottom() + LABEL_GAP + style.font_size,
                escape_xml(&style.font_family),
                style.font_size,
                escape_xml(&style.label_color),
                escape_xml(name)
            ));
        }
    }

    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{total_w}" height="{total_h}" viewBox="0 0 {total_w} {total_h}">
<rect width="{total_w}" height="{total_h}" fill="{bg}"/>
<g transform="translate({tx},{ty})">
{body}
</g>
</svg>"#,
        bg = escape_xml(&style.background),
        tx = pad - bbox.x,
        ty = pad - bbox.y,
    );

    (svg, total_w, total_h)
}

fn render_flow(diagram: &Diagram, flow: &SequenceFlow, stroke: &str) -> String {
    let points: Vec<(f32, f32)> = if flow.waypoints.len() >= 2 {
        flow.waypoints.clone()
    } else {
        match (diagram.node(&flow.source), diagram.node(&flow.target)) {
            (Some(source), Some(target)) => vec![source.bounds.center(), target.bounds.center()],
            _ => return String::new(),
        }
    };

    let path = points
        .iter()
        .map(|(x, y)| format!("{},{}", x, y))
        .collect::<Vec<_>>()
        .join(" ");
    let mut svg = format!(
        r#"<polyline data-element-id="{}" points="{}" fill="none" stroke="{}" stroke-width="2" stroke-linejoin="round" />"#,
        escape_xml(&flow.id),
        path,
        escape_xml(stroke)
    );

    let (x1, y1) = points[points.len() - 2];
    let (x2, y2) = points[points.len() - 1];
    svg.push_str(&render_arrow_head(x2, y2, (y2 - y1).atan2(x2 - x1), stroke));
    svg
}

fn render_arrow_head(x: f32, y: f32, angle: f32, stroke: &str) -> String {
    let cos = angle.cos();
    let sin = angle.sin();
    let p1 = (
        x - cos * ARROW_LENGTH + sin * ARROW_HALF_WIDTH,
        y - sin * ARROW_LENGTH - cos * ARROW_HALF_WIDTH,
    );
    let p2 = (
        x - cos * ARROW_LENGTH - sin * ARROW_HALF_WIDTH,
        y - sin * ARROW_LENGTH + cos * ARROW_HALF_WIDTH,
    );
    format!(
        r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{}" />"#,
        x,
        y,
        p1.0,
        p1.1,
        p2.0,
        p2.1,
        escape_xml(stroke)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderStyle;
    use crate::designer::types::{Bounds, GraphNode};

    fn sample() -> Diagram {
        let mut diagram = Diagram::new();
        diagram
            .add_node(
                GraphNode::new("start", "bpmn:StartEvent", Bounds::new(100.0, 100.0, 36.0, 36.0))
                    .with_name("Begin <here>"),
            )
            .unwrap();
        diagram
            .add_node(GraphNode::new(
                "gw",
                "bpmn:ExclusiveGateway",
                Bounds::new(200.0, 93.0, 100.0, 80.0),
            ))
            .unwrap();
        diagram
            .add_flow(SequenceFlow {
                id: "f1".to_string(),
                source: "start".to_string(),
                target: "gw".to_string(),
                waypoints: Vec::new(),
            })
            .unwrap();
        diagram
    }

    #[test]
    fn document_contains_custom_and_builtin_shapes() {
        let renderer = CustomRenderer::with_style(RenderStyle::default());
        let (svg, width, _) = render_document(&sample(), &renderer, &ExportConfig::default());

        assert_eq!(width, 200.0 + 40.0);
        assert!(svg.contains(
            r##"<polygon points="50,0 100,40 50,80 0,40" fill="#ffffff" stroke="#000000" stroke-width="2" />"##
        ));
        assert!(svg.contains(
            r#"<image href="/icons/condition-flow.svg" x="42" y="32" width="16" height="16" />"#
        ));
        assert!(svg.contains(r#"<circle cx="18" cy="18" r="18""#));
        assert!(svg.contains("Begin &lt;here&gt;"));
        assert!(svg.contains(r#"data-element-id="f1""#));
        assert!(svg.contains("translate(-80,-73)"));
    }

    #[test]
    fn empty_diagram_renders_placeholder() {
        let renderer = CustomRenderer::with_style(RenderStyle::default());
        let (svg, w, h) = render_document(&Diagram::new(), &renderer, &ExportConfig::default());
        assert!(svg.starts_with("<svg"));
        assert_eq!((w, h), (140.0, 90.0));
    }

    #[test]
    fn inliner_falls_back_without_directory() {
        let mut icons = IconInliner::new(None);
        assert_eq!(icons.href(IconRef::TIMER, "/icons/timer.svg"), "/icons/timer.svg");

        let mut icons = IconInliner::new(Some(PathBuf::from("/nonexistent/icons")));
        assert_eq!(icons.href(IconRef::TIMER, "/icons/timer.svg"), "/icons/timer.svg");
    }

    #[test]
    fn inliner_embeds_existing_files() {
        let dir = std::env::temp_dir().join(format!("flowhub-icons-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("rollback.svg"), "<svg/>").unwrap();

        let mut icons = IconInliner::new(Some(dir.clone()));
        let href = icons.href(IconRef::ROLLBACK, "/icons/rollback.svg");
        assert_eq!(href, format!("data:image/svg+xml;base64,{}", BASE64.encode("<svg/>")));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
