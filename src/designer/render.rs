use crate::config::RenderStyle;

use super::registry;
use super::types::{GraphNode, IconRef, ShapeKind};

/// Priority of the custom renderer over the built-in one
pub const CUSTOM_RENDER_PRIORITY: i32 = 2000;

const EVENT_ICON_SIZE: f32 = 20.0;
const GATEWAY_ICON_SIZE: f32 = 16.0;
const TASK_ICON_SIZE: f32 = 24.0;
const TASK_CORNER_RADIUS: f32 = 8.0;

const BPMN_FILL: &str = "white";
const BPMN_STROKE: &str = "#22242a";
const BPMN_TASK_RADIUS: f32 = 10.0;
const BPMN_INNER_OUTER_DIST: f32 = 3.0;

/// Fill and stroke of a drawn primitive
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f32,
}

impl Paint {
    pub fn new(fill: &str, stroke: &str, stroke_width: f32) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            stroke_width,
        }
    }
}

/// Visual primitive in the node's local coordinate space
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        paint: Paint,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        paint: Paint,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        paint: Paint,
    },
    Image {
        icon: IconRef,
        href: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Caller-owned drawing target for one node. Redrawing is the caller's job:
/// clear the surface first, or overlays accumulate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawSurface {
    primitives: Vec<Primitive>,
}

impl DrawSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Rendering service the engine provides out of the box
pub trait BaseRenderer {
    /// Draw `node` into `surface` and return its main shape.
    fn draw_shape(&self, surface: &mut DrawSurface, node: &GraphNode) -> Primitive;

    /// Outline of the node in diagram coordinates, used for edge anchoring.
    fn shape_path(&self, node: &GraphNode) -> String;
}

/// Stock BPMN look: circles for events, rounded boxes for tasks, diamonds
/// for gateways.
#[derive(Debug, Clone, Default)]
pub struct BpmnRenderer;

impl BpmnRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl BaseRenderer for BpmnRenderer {
    fn draw_shape(&self, surface: &mut DrawSurface, node: &GraphNode) -> Primitive {
        let (w, h) = (node.bounds.width, node.bounds.height);

        match registry::shape_for_tag(&node.type_tag) {
            ShapeKind::DecoratedEvent => {
                let r = w.min(h) / 2.0;
                let tag = node.type_tag.trim_start_matches("bpmn:");
                let stroke_width = match tag {
                    "StartEvent" => 2.0,
                    "EndEvent" => 4.0,
                    _ => 1.5,
                };
                let outer = Primitive::Circle {
                    cx: w / 2.0,
                    cy: h / 2.0,
                    r,
                    paint: Paint::new(BPMN_FILL, BPMN_STROKE, stroke_width),
                };
                surface.append(outer.clone());

                // Intermediate events get the double ring.
                if tag != "StartEvent" && tag != "EndEvent" {
                    surface.append(Primitive::Circle {
                        cx: w / 2.0,
                        cy: h / 2.0,
                        r: (r - BPMN_INNER_OUTER_DIST).max(0.0),
                        paint: Paint::new("none", BPMN_STROKE, 1.5),
                    });
                }
                outer
            }
            ShapeKind::DiamondGateway => {
                let diamond = Primitive::Polygon {
                    points: diamond_points(w, h),
                    paint: Paint::new(BPMN_FILL, BPMN_STROKE, 2.0),
                };
                surface.append(diamond.clone());
                diamond
            }
            ShapeKind::RoundedTask => {
                let rect = Primitive::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: w,
                    height: h,
                    radius: BPMN_TASK_RADIUS,
                    paint: Paint::new(BPMN_FILL, BPMN_STROKE, 2.0),
                };
                surface.append(rect.clone());
                rect
            }
        }
    }

    fn shape_path(&self, node: &GraphNode) -> String {
        let b = node.bounds;
        match registry::shape_for_tag(&node.type_tag) {
            ShapeKind::DecoratedEvent => {
                let (cx, cy) = b.center();
                let r = b.width.min(b.height) / 2.0;
                format!(
                    "M{},{}m0,{}a{},{},0,1,1,0,{}a{},{},0,1,1,0,{}z",
                    cx,
                    cy,
                    -r,
                    r,
                    r,
                    2.0 * r,
                    r,
                    r,
                    -2.0 * r
                )
            }
            ShapeKind::DiamondGateway => {
                let hw = b.width / 2.0;
                let hh = b.height / 2.0;
                format!(
                    "M{},{}l{},{}l{},{}l{},{}z",
                    b.x + hw,
                    b.y,
                    hw,
                    hh,
                    -hw,
                    hh,
                    -hw,
                    -hh
                )
            }
            ShapeKind::RoundedTask => {
                let r = BPMN_TASK_RADIUS;
                format!(
                    "M{},{}l{},0a{r},{r},0,0,1,{r},{r}l0,{}a{r},{r},0,0,1,{},{r}l{},0a{r},{r},0,0,1,{},{}l0,{}a{r},{r},0,0,1,{r},{}z",
                    b.x + r,
                    b.y,
                    b.width - 2.0 * r,
                    b.height - 2.0 * r,
                    -r,
                    2.0 * r - b.width,
                    -r,
                    -r,
                    2.0 * r - b.height,
                    -r,
                    r = r
                )
            }
        }
    }
}

fn diamond_points(w: f32, h: f32) -> Vec<(f32, f32)> {
    let cx = w / 2.0;
    let cy = h / 2.0;
    vec![(cx, 0.0), (w, cy), (cx, h), (0.0, cy)]
}

/// How a type tag is drawn by the custom renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRecipe {
    /// Built-in shape, optionally with a centered icon on top.
    DecoratedEvent { icon: Option<IconRef> },
    Gateway { icon: IconRef },
    Task { icon: IconRef },
}

impl DrawRecipe {
    pub fn for_tag(tag: &str) -> Self {
        match registry::lookup(tag) {
            Some(descriptor) => match descriptor.shape {
                ShapeKind::DecoratedEvent => DrawRecipe::DecoratedEvent {
                    icon: descriptor.icon,
                },
                ShapeKind::DiamondGateway => DrawRecipe::Gateway {
                    icon: descriptor.icon.unwrap_or(IconRef::DEFAULT_GATEWAY),
                },
                ShapeKind::RoundedTask => DrawRecipe::Task {
                    icon: descriptor.icon.unwrap_or(IconRef::DEFAULT_TASK),
                },
            },
            // Only gateways keep their shape; any other unknown tag,
            // events included, becomes the default task box.
            None if registry::shape_for_tag(tag) == ShapeKind::DiamondGateway => {
                DrawRecipe::Gateway {
                    icon: IconRef::DEFAULT_GATEWAY,
                }
            }
            None => DrawRecipe::Task {
                icon: IconRef::DEFAULT_TASK,
            },
        }
    }
}

/// Draws the designer's task, gateway and timer shapes, falling back to the
/// base renderer for the outline of every type.
pub struct CustomRenderer<B = BpmnRenderer> {
    base: B,
    style: RenderStyle,
}

impl CustomRenderer<BpmnRenderer> {
    pub fn with_style(style: RenderStyle) -> Self {
        Self::new(BpmnRenderer::new(), style)
    }
}

impl<B: BaseRenderer> CustomRenderer<B> {
    pub fn new(base: B, style: RenderStyle) -> Self {
        Self { base, style }
    }

    pub fn priority(&self) -> i32 {
        CUSTOM_RENDER_PRIORITY
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// True for the tags this renderer takes over from the base renderer.
    pub fn can_render(&self, node: &GraphNode) -> bool {
        registry::lookup(&node.type_tag).is_some_and(|d| d.has_custom_rendering())
    }

    /// Draw `node` into `surface` and return its main shape. Total over all
    /// tags; unknown tags get the default task box and icon.
    pub fn draw_shape(&self, surface: &mut DrawSurface, node: &GraphNode) -> Primitive {
        let (w, h) = (node.bounds.width, node.bounds.height);

        match DrawRecipe::for_tag(&node.type_tag) {
            DrawRecipe::DecoratedEvent { icon } => {
                let shape = self.base.draw_shape(surface, node);
                if let Some(icon) = icon {
                    surface.append(self.centered_icon(icon, w, h, EVENT_ICON_SIZE));
                }
                shape
            }
            DrawRecipe::Gateway { icon } => {
                let diamond = Primitive::Polygon {
                    points: diamond_points(w, h),
                    paint: self.paint(),
                };
                surface.append(diamond.clone());
                surface.append(self.centered_icon(icon, w, h, GATEWAY_ICON_SIZE));
                diamond
            }
            DrawRecipe::Task { icon } => {
                let rect = Primitive::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: w,
                    height: h,
                    radius: TASK_CORNER_RADIUS,
                    paint: self.paint(),
                };
                surface.append(rect.clone());
                surface.append(self.centered_icon(icon, w, h, TASK_ICON_SIZE));
                rect
            }
        }
    }

    /// Boundary used for routing; custom visuals never change it.
    pub fn shape_path(&self, node: &GraphNode) -> String {
        self.base.shape_path(node)
    }

    fn paint(&self) -> Paint {
        Paint::new(&self.style.fill, &self.style.stroke, self.style.stroke_width)
    }

    fn centered_icon(&self, icon: IconRef, w: f32, h: f32, size: f32) -> Primitive {
        Primitive::Image {
            icon,
            href: self.style.icon_href(icon.file_name()),
            x: (w - size) / 2.0,
            y: (h - size) / 2.0,
            width: size,
            height: size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designer::types::{Bounds, NodeKind};

    fn node(tag: &str, width: f32, height: f32) -> GraphNode {
        GraphNode::new("n1", tag, Bounds::new(200.0, 100.0, width, height))
    }

    fn renderer() -> CustomRenderer {
        CustomRenderer::with_style(RenderStyle::default())
    }

    fn image_of(surface: &DrawSurface) -> (IconRef, f32, f32, f32, f32) {
        surface
            .primitives()
            .iter()
            .find_map(|p| match p {
                Primitive::Image {
                    icon,
                    x,
                    y,
                    width,
                    height,
                    ..
                } => Some((*icon, *x, *y, *width, *height)),
                _ => None,
            })
            .expect("icon overlay")
    }

    #[test]
    fn exclusive_gateway_diamond_and_icon() {
        let mut surface = DrawSurface::new();
        let shape =
            renderer().draw_shape(&mut surface, &node("bpmn:ExclusiveGateway", 100.0, 80.0));

        match shape {
            Primitive::Polygon { points, paint } => {
                assert_eq!(points, vec![(50.0, 0.0), (100.0, 40.0), (50.0, 80.0), (0.0, 40.0)]);
                assert_eq!(paint.fill, "#ffffff");
                assert_eq!(paint.stroke_width, 2.0);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(
            image_of(&surface),
            (IconRef::CONDITION_FLOW, 42.0, 32.0, 16.0, 16.0)
        );
        assert_eq!(surface.len(), 2);
    }

    #[test]
    fn parallel_gateway_uses_rollback_icon() {
        let mut surface = DrawSurface::new();
        renderer().draw_shape(&mut surface, &node("bpmn:ParallelGateway", 50.0, 50.0));
        assert_eq!(image_of(&surface).0, IconRef::ROLLBACK);
    }

    #[test]
    fn unknown_gateway_uses_default_gateway_icon() {
        let mut surface = DrawSurface::new();
        let shape = renderer().draw_shape(&mut surface, &node("bpmn:InclusiveGateway", 50.0, 50.0));
        assert!(matches!(shape, Primitive::Polygon { .. }));
        assert_eq!(image_of(&surface).0, IconRef::DEFAULT_GATEWAY);
    }

    #[test]
    fn task_kinds_map_to_their_icons() {
        let cases = [
            (NodeKind::Switch, IconRef::SWITCH_TASK),
            (NodeKind::Join, IconRef::JOIN_TASK),
            (NodeKind::Broadcast, IconRef::BROADCAST_TASK),
            (NodeKind::JoinBroadcast, IconRef::JOIN_BROADCAST_TASK),
        ];
        for (kind, expected) in cases {
            let mut surface = DrawSurface::new();
            let shape = renderer().draw_shape(&mut surface, &node(kind.type_tag(), 100.0, 80.0));
            assert_eq!(
                shape,
                Primitive::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 80.0,
                    radius: 8.0,
                    paint: Paint::new("#ffffff", "#000000", 2.0),
                }
            );
            assert_eq!(image_of(&surface), (expected, 38.0, 28.0, 24.0, 24.0));
        }
    }

    #[test]
    fn unrecognized_type_falls_back_to_default_task() {
        let r = renderer();
        let n = node("bpmn:SendTask", 120.0, 60.0);
        assert!(!r.can_render(&n));

        let mut surface = DrawSurface::new();
        let shape = r.draw_shape(&mut surface, &n);
        assert!(matches!(shape, Primitive::Rect { radius, .. } if radius == 8.0));
        assert_eq!(image_of(&surface), (IconRef::DEFAULT_TASK, 48.0, 18.0, 24.0, 24.0));
    }

    #[test]
    fn unknown_event_is_drawn_as_default_task() {
        let r = renderer();
        let n = node("bpmn:BoundaryEvent", 36.0, 36.0);
        assert!(!r.can_render(&n));

        let mut surface = DrawSurface::new();
        let shape = r.draw_shape(&mut surface, &n);
        assert!(matches!(shape, Primitive::Rect { radius, .. } if radius == 8.0));
        assert_eq!(image_of(&surface), (IconRef::DEFAULT_TASK, 6.0, 6.0, 24.0, 24.0));
        assert_eq!(surface.len(), 2);
    }

    #[test]
    fn timer_event_overlays_icon_on_base_shape() {
        let mut surface = DrawSurface::new();
        let timer = node("bpmn:IntermediateCatchEvent", 36.0, 36.0);
        let shape = renderer().draw_shape(&mut surface, &timer);

        assert!(matches!(shape, Primitive::Circle { r, .. } if r == 18.0));
        let (icon, x, y, w, h) = image_of(&surface);
        assert_eq!(icon, IconRef::TIMER);
        assert_eq!((x, y, w, h), (8.0, 8.0, 20.0, 20.0));
        assert_eq!(
            surface.primitives().last().map(|p| matches!(p, Primitive::Image { .. })),
            Some(true)
        );
    }

    #[test]
    fn can_render_only_custom_tags() {
        let r = renderer();
        assert!(r.can_render(&node("bpmn:UserTask", 100.0, 80.0)));
        assert!(r.can_render(&node("bpmn:IntermediateCatchEvent", 36.0, 36.0)));
        assert!(!r.can_render(&node("bpmn:StartEvent", 36.0, 36.0)));
        assert!(!r.can_render(&node("bpmn:EndEvent", 36.0, 36.0)));
        assert_eq!(r.priority(), CUSTOM_RENDER_PRIORITY);
    }

    #[test]
    fn redraw_into_cleared_surface_is_identical() {
        let r = renderer();
        let n = node("bpmn:ScriptTask", 100.0, 80.0);
        let mut surface = DrawSurface::new();
        r.draw_shape(&mut surface, &n);
        let first = surface.clone();

        surface.clear();
        r.draw_shape(&mut surface, &n);
        assert_eq!(surface, first);
    }

    #[test]
    fn shape_path_delegates_to_base() {
        let r = renderer();
        for tag in ["bpmn:UserTask", "bpmn:ExclusiveGateway", "bpmn:IntermediateCatchEvent"] {
            let n = node(tag, 100.0, 80.0);
            assert_eq!(r.shape_path(&n), BpmnRenderer::new().shape_path(&n));
        }
    }

    #[test]
    fn base_paths_use_diagram_coordinates() {
        let base = BpmnRenderer::new();
        assert_eq!(
            base.shape_path(&node("bpmn:ExclusiveGateway", 100.0, 80.0)),
            "M250,100l50,40l-50,40l-50,-40z"
        );
        assert_eq!(
            base.shape_path(&node("bpmn:StartEvent", 36.0, 36.0)),
            "M218,118m0,-18a18,18,0,1,1,0,36a18,18,0,1,1,0,-36z"
        );
    }
}
