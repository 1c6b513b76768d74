use zdraw_core::draw::{DrawSink, Primitive, RecordingSink};
use zdraw_core::geometry::{Point2, Vector2};
use zdraw_core::group::ShapeGroup;
use zdraw_core::shape::{Shape, ShapeTag};
use zdraw_core::shapes::Circle;
use zdraw_io::{
    IoError, LeafPayload, Registries, TextFacade, TokenReader, TokenWriter, register_leaf,
};

/// 库外定义的新图形种类，只通过注册接入读写流程。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Triangle {
    vertices: [Point2; 3],
}

impl Triangle {
    const TAG: ShapeTag = ShapeTag::new("Triangle");
}

impl Shape for Triangle {
    fn tag(&self) -> ShapeTag {
        Self::TAG
    }

    fn translate(&mut self, offset: Vector2) {
        for vertex in &mut self.vertices {
            *vertex = vertex.translate(offset);
        }
    }

    fn draw(&self, sink: &mut dyn DrawSink) {
        sink.emit(Primitive::Polygon(self.vertices.to_vec()));
    }
}

impl LeafPayload for Triangle {
    fn read_payload(tokens: &mut TokenReader<'_>) -> Result<Self, IoError> {
        let a = tokens.parse_point("Triangle 顶点 A")?;
        let b = tokens.parse_point("Triangle 顶点 B")?;
        let c = tokens.parse_point("Triangle 顶点 C")?;
        Ok(Triangle {
            vertices: [a, b, c],
        })
    }

    fn write_payload(&self, out: &mut TokenWriter<'_>) -> Result<(), IoError> {
        for vertex in self.vertices {
            out.point(vertex)?;
        }
        Ok(())
    }
}

fn triangle() -> Triangle {
    Triangle {
        vertices: [Point2::new(0, 0), Point2::new(4, 0), Point2::new(0, 3)],
    }
}

#[test]
fn registered_custom_kind_round_trips_through_groups() {
    let mut registries = Registries::with_builtin_shapes().unwrap();
    register_leaf::<Triangle>(&mut registries).expect("注册 Triangle 失败");

    let mut inner = ShapeGroup::new();
    inner.add(Box::new(triangle()));
    let mut root = ShapeGroup::new();
    root.add(Box::new(Circle::new(Point2::new(1, 1), 1)));
    root.add(Box::new(inner));

    let facade = TextFacade::new(&registries);
    let text = facade.write_string(&root).unwrap();
    assert!(text.contains("    Triangle 0 0 4 0 0 3\n"));

    let reloaded = facade.read_str(&text).unwrap().unwrap();
    assert_eq!(reloaded, root);

    let mut sink = RecordingSink::new();
    reloaded.draw(&mut sink);
    assert_eq!(sink.len(), 2);
}

#[test]
fn custom_kind_is_unknown_until_registered() {
    let registries = Registries::with_builtin_shapes().unwrap();
    let facade = TextFacade::new(&registries);
    let err = facade
        .read_str("ShapeGroup 1 Triangle 0 0 4 0 0 3")
        .unwrap_err();
    assert!(matches!(err, IoError::UnregisteredType(ref id) if id == "Triangle"));

    let mut root = ShapeGroup::new();
    root.add(Box::new(triangle()));
    let err = facade.write_string(&root).unwrap_err();
    assert!(matches!(err, IoError::UnregisteredType(_)));
}

#[test]
fn registering_custom_kind_twice_is_rejected() {
    let mut registries = Registries::new();
    register_leaf::<Triangle>(&mut registries).unwrap();
    let err = register_leaf::<Triangle>(&mut registries).unwrap_err();
    assert!(matches!(err, IoError::DuplicateRegistration(ref tag) if tag == "Triangle"));
    assert_eq!(registries.factory.len(), 1);
    assert_eq!(registries.codecs.len(), 1);
}

#[test]
fn cloning_custom_kind_inside_group_is_deep() {
    let mut root = ShapeGroup::new();
    root.add(Box::new(triangle()));
    let mut copy = root.clone();
    copy.translate(Vector2::new(1, 1));

    let original = root
        .get(0)
        .and_then(|shape| shape.as_any().downcast_ref::<Triangle>())
        .unwrap();
    assert_eq!(*original, triangle());
}
