use super::graph::{NodeId, SceneGraph};
use super::objects::{DesignedObject, EMITTER_HIGHLIGHT, LISTENER_HIGHLIGHT};

pub fn highlight(graph: &mut SceneGraph, object: &DesignedObject) {
    let color = match object {
        DesignedObject::Emitter(_) => EMITTER_HIGHLIGHT,
        DesignedObject::Listener(_) => LISTENER_HIGHLIGHT,
    };
    for (node, _) in object.primary_parts() {
        graph.set_color(node, color);
    }
}

pub fn restore_default_colors(graph: &mut SceneGraph, object: &DesignedObject) {
    for (node, color) in object.primary_parts() {
        graph.set_color(node, color);
    }
}

/// Parts eligible for pointer hit-testing.
pub fn clickable_parts(object: &DesignedObject) -> Vec<NodeId> {
    object
        .primary_parts()
        .into_iter()
        .map(|(node, _)| node)
        .collect()
}

pub fn show_listener_cones(graph: &mut SceneGraph, object: &DesignedObject) {
    set_cones_visible(graph, object, true);
}

pub fn hide_listener_cones(graph: &mut SceneGraph, object: &DesignedObject) {
    set_cones_visible(graph, object, false);
}

fn set_cones_visible(graph: &mut SceneGraph, object: &DesignedObject, visible: bool) {
    if let DesignedObject::Listener(listener) = object {
        graph.set_visible(listener.parts.cone_left, visible);
        graph.set_visible(listener.parts.cone_right, visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::objects::{
        create_emitter_display, create_listener_display, EMITTER_WINGS_COLOR, LISTENER_POLE_COLOR,
    };
    use crate::scene::{EmitterData, ListenerData, Position};

    #[test]
    fn highlight_then_restore() {
        let mut graph = SceneGraph::new();
        let emitter = DesignedObject::Emitter(create_emitter_display(
            &mut graph,
            &EmitterData::new(1, Position::new(0.0, 1.0, 0.0)),
        ));
        highlight(&mut graph, &emitter);
        for node in clickable_parts(&emitter) {
            assert_eq!(graph.get(node).unwrap().material.color, EMITTER_HIGHLIGHT);
        }
        restore_default_colors(&mut graph, &emitter);
        let wings = emitter.as_emitter().unwrap().parts.wings;
        assert_eq!(graph.get(wings).unwrap().material.color, EMITTER_WINGS_COLOR);
    }

    #[test]
    fn listener_cones_are_not_clickable() {
        let mut graph = SceneGraph::new();
        let listener = DesignedObject::Listener(create_listener_display(
            &mut graph,
            &ListenerData::new(2, Position::new(0.0, 1.0, 0.0)),
        ));
        let parts = listener.as_listener().unwrap().parts;
        let clickable = clickable_parts(&listener);
        assert_eq!(clickable.len(), 5);
        assert!(!clickable.contains(&parts.cone_left));
        assert!(!clickable.contains(&parts.cone_right));

        highlight(&mut graph, &listener);
        assert_eq!(
            graph.get(parts.cone_left).unwrap().material.color,
            crate::render::objects::LISTENER_COLOR
        );
        restore_default_colors(&mut graph, &listener);
        assert_eq!(
            graph.get(parts.pole).unwrap().material.color,
            LISTENER_POLE_COLOR
        );
    }

    #[test]
    fn cone_visibility_toggles() {
        let mut graph = SceneGraph::new();
        let listener = DesignedObject::Listener(create_listener_display(
            &mut graph,
            &ListenerData::new(2, Position::new(0.0, 1.0, 0.0)),
        ));
        let cone = listener.as_listener().unwrap().parts.cone_right;
        show_listener_cones(&mut graph, &listener);
        assert!(graph.get(cone).unwrap().visible);
        hide_listener_cones(&mut graph, &listener);
        assert!(!graph.get(cone).unwrap().visible);
    }
}
