//! Editor state: the scene, the active tool and the numeric input.

use crate::config::EditorConfig;
use crate::protocol::SolverUpdate;
use crate::render::RenderAdapter;
use crate::scene::Scene;
use crate::tools::{ToolContext, ToolKind, ToolManager, ToolOutput};
use kurbo::Point;

/// Parse the shell's raw numeric field. Empty or non-numeric text is no value.
pub fn parse_input_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Interactive editor over a scene.
#[derive(Debug)]
pub struct Editor<R: RenderAdapter> {
    scene: Scene<R>,
    tools: ToolManager,
    config: EditorConfig,
    /// Target value for the set-angle / set-distance tools.
    input_value: Option<f64>,
}

impl<R: RenderAdapter> Editor<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, EditorConfig::default())
    }

    pub fn with_config(renderer: R, config: EditorConfig) -> Self {
        Self {
            scene: Scene::new(renderer),
            tools: ToolManager::new(),
            config,
            input_value: None,
        }
    }

    pub fn scene(&self) -> &Scene<R> {
        &self.scene
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool()
    }

    pub fn input_value(&self) -> Option<f64> {
        self.input_value
    }

    pub fn set_input_value(&mut self, value: Option<f64>) {
        self.input_value = value;
    }

    /// Set the input value from the shell's raw field text.
    pub fn set_input_text(&mut self, raw: &str) {
        self.input_value = parse_input_value(raw);
    }

    /// Activate a tool. Any gesture in progress is abandoned and its
    /// provisional drawing removed.
    pub fn set_tool(&mut self, kind: ToolKind) {
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            config: &self.config,
            input_value: self.input_value,
        };
        self.tools.set_tool(kind, &mut ctx);
    }

    pub fn pointer_down(&mut self, position: Point) -> Option<ToolOutput> {
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            config: &self.config,
            input_value: self.input_value,
        };
        let output = self.tools.press(&mut ctx, position);
        self.after_gesture(output)
    }

    pub fn pointer_drag(&mut self, position: Point) {
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            config: &self.config,
            input_value: self.input_value,
        };
        self.tools.drag(&mut ctx, position);
    }

    pub fn pointer_up(&mut self, position: Point) -> Option<ToolOutput> {
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            config: &self.config,
            input_value: self.input_value,
        };
        let output = self.tools.release(&mut ctx, position);
        self.after_gesture(output)
    }

    fn after_gesture(&mut self, output: Option<ToolOutput>) -> Option<ToolOutput> {
        // The input value is consumed by whatever intent goes out next.
        if let Some(ToolOutput::Intent(intent)) = &output {
            log::debug!("Gesture completed: {}", intent.operation());
            self.input_value = None;
        }
        output
    }

    /// Overwrite positions with the solver's authoritative coordinates.
    ///
    /// Never produces outbound traffic. Ids the scene does not know are skipped.
    pub fn apply_solver_update(&mut self, update: &SolverUpdate) {
        for point in &update.points {
            if let Err(e) = self.scene.set_position(point.uid, Point::new(point.x, point.y)) {
                log::warn!("Solver update skipped: {e}");
            }
        }
        for line in &update.lines {
            let Some(endpoints) = self.scene.line(line.uid).map(|l| l.endpoints) else {
                log::warn!("Solver update skipped: unknown line {}", line.uid);
                continue;
            };
            for (id, position) in endpoints.into_iter().zip([line.point1, line.point2]) {
                if let Err(e) = self.scene.set_position(id, position.into()) {
                    log::error!("Line {} has a dangling endpoint: {e}", line.uid);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::QueryResult;
    use crate::protocol::{Intent, LineUpdate, PointRef, PointUpdate, WirePoint};
    use crate::render::recording::RecordingRenderer;
    use crate::scene::PointKind;
    use crate::tools::Tool;
    use uuid::Uuid;

    fn editor() -> Editor<RecordingRenderer> {
        Editor::new(RecordingRenderer::default())
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn click(editor: &mut Editor<RecordingRenderer>, at: Point) -> Option<ToolOutput> {
        let down = editor.pointer_down(at);
        let up = editor.pointer_up(at);
        down.or(up)
    }

    fn draw_line(editor: &mut Editor<RecordingRenderer>, from: Point, to: Point) -> Option<ToolOutput> {
        editor.set_tool(ToolKind::Line);
        editor.pointer_down(from);
        editor.pointer_drag(to);
        editor.pointer_up(to)
    }

    fn intent(output: Option<ToolOutput>) -> Intent {
        match output {
            Some(ToolOutput::Intent(intent)) => intent,
            other => panic!("expected an intent, got {other:?}"),
        }
    }

    fn line_uid(output: Option<ToolOutput>) -> Uuid {
        match intent(output) {
            Intent::CreateLine { uid, .. } => uid,
            other => panic!("expected create_line, got {other:?}"),
        }
    }

    #[test]
    fn test_point_presses_create_free_points_in_order() {
        let mut editor = editor();
        let positions = [p(10.0, 10.0), p(50.0, 20.0), p(-3.0, 7.5), p(10.0, 10.0)];
        for &pos in &positions {
            click(&mut editor, pos);
        }
        let points: Vec<_> = editor.scene().points().collect();
        assert_eq!(points.len(), positions.len());
        for (point, &pos) in points.iter().zip(&positions) {
            assert_eq!(point.kind, PointKind::Free);
            assert_eq!(point.position, pos);
        }
    }

    #[test]
    fn test_point_press_emits_create_point() {
        let mut editor = editor();
        let out = editor.pointer_down(p(10.0, 10.0));
        let id = editor.scene().points().next().unwrap().id();
        let json = serde_json::to_value(intent(out)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": { "uid": id.to_string(), "point": { "x": 10.0, "y": 10.0 } },
                "operation": "create_point",
            })
        );
        assert_eq!(editor.scene().renderer().markers[&id], p(10.0, 10.0));
    }

    #[test]
    fn test_short_line_is_discarded() {
        let mut editor = editor();
        let out = draw_line(&mut editor, p(0.0, 0.0), p(6.0, 7.9));
        assert!(out.is_none());
        assert!(editor.scene().is_empty());
        assert!(editor.scene().renderer().preview.is_none());
    }

    #[test]
    fn test_line_at_threshold_is_committed() {
        let mut editor = editor();
        let out = draw_line(&mut editor, p(0.0, 0.0), p(6.0, 8.0));
        match intent(out) {
            Intent::CreateLine { uid, point1, point2 } => {
                assert_eq!(point1, WirePoint { x: 0.0, y: 0.0 });
                assert_eq!(point2, WirePoint { x: 6.0, y: 8.0 });
                assert_eq!(editor.scene().line_endpoints(uid), Some([p(0.0, 0.0), p(6.0, 8.0)]));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(editor.scene().line_count(), 1);
        assert_eq!(editor.scene().point_count(), 2);
        assert!(editor.scene().points().all(|pt| pt.is_endpoint()));
        assert!(editor.scene().renderer().preview.is_none());
    }

    #[test]
    fn test_line_preview_follows_drag() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Line);
        editor.pointer_down(p(0.0, 0.0));
        assert_eq!(editor.scene().renderer().preview, Some((p(0.0, 0.0), p(0.0, 0.0))));
        editor.pointer_drag(p(40.0, 0.0));
        assert_eq!(editor.scene().renderer().preview, Some((p(0.0, 0.0), p(40.0, 0.0))));
        assert!(editor.tools().is_active());
    }

    #[test]
    fn test_drag_free_point() {
        let mut editor = editor();
        click(&mut editor, p(10.0, 10.0));
        let id = editor.scene().points().next().unwrap().id();

        editor.set_tool(ToolKind::Drag);
        assert!(editor.pointer_down(p(10.0, 10.0)).is_none());
        editor.pointer_drag(p(15.0, 15.0));
        // Visual only until release.
        assert_eq!(editor.scene().point(id).unwrap().position, p(10.0, 10.0));
        assert_eq!(editor.scene().renderer().markers[&id], p(15.0, 15.0));

        let out = editor.pointer_up(p(20.0, 20.0));
        let json = serde_json::to_value(intent(out)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": { "uid": id.to_string(), "point": { "x": 20.0, "y": 20.0 } },
                "operation": "drag_point",
            })
        );
        assert_eq!(editor.scene().point(id).unwrap().position, p(20.0, 20.0));
    }

    #[test]
    fn test_drag_endpoint_emits_drag_line() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));

        editor.set_tool(ToolKind::Drag);
        editor.pointer_down(p(100.0, 0.0));
        editor.pointer_drag(p(100.0, 30.0));
        assert_eq!(editor.scene().renderer().segments[&line][1], p(100.0, 30.0));
        assert_eq!(editor.scene().line_endpoints(line).unwrap()[1], p(100.0, 0.0));

        let out = editor.pointer_up(p(100.0, 50.0));
        assert_eq!(
            intent(out),
            Intent::DragLine {
                uid: line,
                point1: WirePoint { x: 0.0, y: 0.0 },
                point2: WirePoint { x: 100.0, y: 50.0 },
            }
        );
        assert_eq!(editor.scene().line_endpoints(line), Some([p(0.0, 0.0), p(100.0, 50.0)]));
    }

    #[test]
    fn test_drag_miss_is_noop() {
        let mut editor = editor();
        click(&mut editor, p(10.0, 10.0));
        editor.set_tool(ToolKind::Drag);
        editor.pointer_down(p(200.0, 200.0));
        editor.pointer_drag(p(210.0, 210.0));
        assert!(editor.pointer_up(p(220.0, 220.0)).is_none());
        assert_eq!(editor.scene().points().next().unwrap().position, p(10.0, 10.0));
    }

    #[test]
    fn test_vertical_and_horizontal() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 20.0)));

        editor.set_tool(ToolKind::Vertical);
        assert_eq!(intent(editor.pointer_down(p(50.0, 10.0))), Intent::Vertical { uid: line });
        assert!(editor.pointer_down(p(50.0, 90.0)).is_none());

        editor.set_tool(ToolKind::Horizontal);
        assert_eq!(intent(editor.pointer_down(p(50.0, 10.0))), Intent::Horizontal { uid: line });
        assert!(editor.scene().lines().all(|l| !l.highlighted));
    }

    #[test]
    fn test_parallel_pair_protocol() {
        let mut editor = editor();
        let a = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        let b = line_uid(draw_line(&mut editor, p(0.0, 50.0), p(100.0, 80.0)));

        editor.set_tool(ToolKind::Parallel);
        // Miss keeps slot A empty.
        assert!(editor.pointer_down(p(50.0, 300.0)).is_none());
        assert!(editor.pointer_down(p(50.0, 0.0)).is_none());
        assert!(editor.scene().line(a).unwrap().highlighted);

        // Picking A again does nothing.
        assert!(editor.pointer_down(p(50.0, 0.0)).is_none());
        assert!(editor.scene().line(a).unwrap().highlighted);

        let out = editor.pointer_down(p(50.0, 65.0));
        assert_eq!(intent(out), Intent::Parallel { uid1: a, uid2: b });
        assert!(!editor.scene().line(a).unwrap().highlighted);
        assert!(!editor.scene().renderer().highlighted.contains(&a));
        match editor.tools().tool() {
            Tool::Pair(selection) => {
                assert_eq!(selection.first, Some(a));
                assert_eq!(selection.second, Some(b));
            }
            other => panic!("unexpected {other:?}"),
        }

        // Next press starts over and fills slot A from this press.
        assert!(editor.pointer_down(p(50.0, 65.0)).is_none());
        match editor.tools().tool() {
            Tool::Pair(selection) => {
                assert_eq!(selection.first, Some(b));
                assert_eq!(selection.second, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(editor.scene().line(b).unwrap().highlighted);
    }

    #[test]
    fn test_perpendicular_emits_perpendicular() {
        let mut editor = editor();
        let a = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        let b = line_uid(draw_line(&mut editor, p(200.0, 0.0), p(200.0, 100.0)));
        editor.set_tool(ToolKind::Perpendicular);
        editor.pointer_down(p(50.0, 0.0));
        let out = editor.pointer_down(p(200.0, 50.0));
        assert_eq!(intent(out), Intent::Perpendicular { uid1: a, uid2: b });
    }

    #[test]
    fn test_connect_requires_endpoint_first() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        editor.set_tool(ToolKind::Point);
        click(&mut editor, p(200.0, 200.0));
        let free = editor.scene().points().last().unwrap().id();

        editor.set_tool(ToolKind::Connect);
        // A free point cannot fill slot A.
        assert!(editor.pointer_down(p(200.0, 200.0)).is_none());
        match editor.tools().tool() {
            Tool::Pair(selection) => assert_eq!(selection.first, None),
            other => panic!("unexpected {other:?}"),
        }

        editor.pointer_down(p(100.0, 0.0));
        let out = editor.pointer_down(p(200.0, 200.0));
        assert_eq!(
            intent(out),
            Intent::ConnectPoints {
                point1: PointRef { uid: line, point_num: Some(1) },
                point2: PointRef { uid: free, point_num: None },
            }
        );
    }

    #[test]
    fn test_attach_point_to_line() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        editor.set_tool(ToolKind::Point);
        click(&mut editor, p(50.0, 80.0));
        let point = editor.scene().points().last().unwrap().id();

        editor.set_tool(ToolKind::AttachPointToLine);
        // A line press cannot fill the point slot.
        assert!(editor.pointer_down(p(50.0, 0.0)).is_none());
        editor.pointer_down(p(50.0, 80.0));
        assert!(editor.scene().point(point).unwrap().highlighted);
        let out = editor.pointer_down(p(50.0, 1.0));
        assert_eq!(intent(out), Intent::AttachPointToLine { uid1: point, uid2: line });
        assert!(!editor.scene().point(point).unwrap().highlighted);
    }

    #[test]
    fn test_attach_press_after_completion_starts_over() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        editor.set_tool(ToolKind::Point);
        click(&mut editor, p(50.0, 80.0));
        let first = editor.scene().points().last().unwrap().id();
        click(&mut editor, p(20.0, -60.0));
        let second = editor.scene().points().last().unwrap().id();

        editor.set_tool(ToolKind::AttachPointToLine);
        editor.pointer_down(p(50.0, 80.0));
        let out = editor.pointer_down(p(50.0, 0.0));
        assert_eq!(intent(out), Intent::AttachPointToLine { uid1: first, uid2: line });

        assert!(editor.pointer_down(p(20.0, -60.0)).is_none());
        match editor.tools().tool() {
            Tool::Pair(selection) => {
                assert_eq!(selection.first, Some(second));
                assert_eq!(selection.second, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(editor.scene().point(second).unwrap().highlighted);
        assert!(!editor.scene().point(first).unwrap().highlighted);
        assert!(!editor.scene().line(line).unwrap().highlighted);
    }

    #[test]
    fn test_connect_ignores_same_endpoint_in_slot_b() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        editor.set_tool(ToolKind::Point);
        click(&mut editor, p(200.0, 200.0));
        let free = editor.scene().points().last().unwrap().id();
        let end = editor.scene().line(line).unwrap().endpoints[1];

        editor.set_tool(ToolKind::Connect);
        assert!(editor.pointer_down(p(100.0, 0.0)).is_none());
        assert!(editor.pointer_down(p(100.0, 0.0)).is_none());
        match editor.tools().tool() {
            Tool::Pair(selection) => {
                assert_eq!(selection.first, Some(end));
                assert_eq!(selection.second, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(editor.scene().point(end).unwrap().highlighted);

        let out = editor.pointer_down(p(200.0, 200.0));
        assert_eq!(
            intent(out),
            Intent::ConnectPoints {
                point1: PointRef { uid: line, point_num: Some(1) },
                point2: PointRef { uid: free, point_num: None },
            }
        );
        assert!(!editor.scene().point(end).unwrap().highlighted);
    }

    #[test]
    fn test_set_angle_consumes_input_value() {
        let mut editor = editor();
        let a = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        let b = line_uid(draw_line(&mut editor, p(0.0, 50.0), p(100.0, 90.0)));

        editor.set_tool(ToolKind::AngleBetweenLines);
        editor.set_input_text("30");
        editor.pointer_down(p(50.0, 0.0));
        let out = editor.pointer_down(p(50.0, 70.0));
        assert_eq!(
            intent(out),
            Intent::AngleBetweenLines { uid1: a, uid2: b, angle: Some(30.0) }
        );
        assert_eq!(editor.input_value(), None);
    }

    #[test]
    fn test_set_distance() {
        let mut editor = editor();
        click(&mut editor, p(0.0, 0.0));
        click(&mut editor, p(30.0, 40.0));
        let ids: Vec<_> = editor.scene().points().map(|pt| pt.id()).collect();

        editor.set_tool(ToolKind::DistanceBetweenPoints);
        editor.set_input_value(Some(12.5));
        editor.pointer_down(p(0.0, 0.0));
        let out = editor.pointer_down(p(30.0, 40.0));
        assert_eq!(
            intent(out),
            Intent::DistanceBetweenPoints { uid1: ids[0], uid2: ids[1], dist: Some(12.5) }
        );
    }

    #[test]
    fn test_get_angle_is_local() {
        let mut editor = editor();
        draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0));
        draw_line(&mut editor, p(200.0, 0.0), p(300.0, 100.0));

        editor.set_tool(ToolKind::GetAngleBetweenLines);
        editor.pointer_down(p(50.0, 0.0));
        match editor.pointer_down(p(250.0, 50.0)) {
            Some(ToolOutput::Query(QueryResult::Angle(angle))) => assert!((angle - 45.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_get_distance_is_local() {
        let mut editor = editor();
        click(&mut editor, p(0.0, 0.0));
        click(&mut editor, p(30.0, 40.0));
        editor.set_input_value(Some(1.0));

        editor.set_tool(ToolKind::GetDistanceBetweenPoints);
        editor.pointer_down(p(0.0, 0.0));
        let out = editor.pointer_down(p(30.0, 40.0));
        assert_eq!(out, Some(ToolOutput::Query(QueryResult::Distance(50.0))));
        // Queries do not consume the input value.
        assert_eq!(editor.input_value(), Some(1.0));
    }

    #[test]
    fn test_tool_switch_rolls_back_line_preview() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Line);
        editor.pointer_down(p(0.0, 0.0));
        editor.pointer_drag(p(80.0, 0.0));

        editor.set_tool(ToolKind::Point);
        assert!(editor.scene().renderer().preview.is_none());
        assert!(!editor.tools().is_active());
        // The release lands on the new tool and creates nothing.
        assert!(editor.pointer_up(p(80.0, 0.0)).is_none());
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_tool_switch_rolls_back_drag() {
        let mut editor = editor();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        editor.set_tool(ToolKind::Drag);
        editor.pointer_down(p(0.0, 0.0));
        editor.pointer_drag(p(-40.0, 40.0));
        assert_eq!(editor.scene().renderer().segments[&line][0], p(-40.0, 40.0));

        editor.set_tool(ToolKind::Vertical);
        let drawn = editor.scene().renderer();
        assert_eq!(drawn.segments[&line], [p(0.0, 0.0), p(100.0, 0.0)]);
        let e0 = editor.scene().line(line).unwrap().endpoints[0];
        assert_eq!(drawn.markers[&e0], p(0.0, 0.0));
    }

    #[test]
    fn test_tool_switch_clears_selection_highlight() {
        let mut editor = editor();
        let a = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));
        editor.set_tool(ToolKind::Parallel);
        editor.pointer_down(p(50.0, 0.0));
        assert!(editor.scene().line(a).unwrap().highlighted);

        editor.set_tool(ToolKind::Perpendicular);
        assert!(!editor.scene().line(a).unwrap().highlighted);
        assert!(editor.scene().renderer().highlighted.is_empty());
        match editor.tools().tool() {
            Tool::Pair(selection) => assert_eq!(selection.first, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reselecting_same_tool_keeps_state() {
        let mut editor = editor();
        draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0));
        editor.set_tool(ToolKind::Parallel);
        editor.pointer_down(p(50.0, 0.0));
        editor.set_tool(ToolKind::Parallel);
        match editor.tools().tool() {
            Tool::Pair(selection) => assert!(selection.first.is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_apply_solver_update() {
        let mut editor = editor();
        click(&mut editor, p(10.0, 10.0));
        let point = editor.scene().points().next().unwrap().id();
        let line = line_uid(draw_line(&mut editor, p(0.0, 0.0), p(100.0, 0.0)));

        let update = SolverUpdate {
            points: vec![
                PointUpdate { uid: point, x: 11.0, y: 12.0 },
                PointUpdate { uid: Uuid::new_v4(), x: 0.0, y: 0.0 },
            ],
            lines: vec![LineUpdate {
                uid: line,
                point1: WirePoint { x: 1.0, y: 2.0 },
                point2: WirePoint { x: 3.0, y: 90.0 },
            }],
        };
        editor.apply_solver_update(&update);

        assert_eq!(editor.scene().point(point).unwrap().position, p(11.0, 12.0));
        assert_eq!(editor.scene().line_endpoints(line), Some([p(1.0, 2.0), p(3.0, 90.0)]));
        assert_eq!(editor.scene().renderer().segments[&line], [p(1.0, 2.0), p(3.0, 90.0)]);
        assert_eq!(editor.scene().renderer().markers[&point], p(11.0, 12.0));
    }

    #[test]
    fn test_parse_input_value() {
        assert_eq!(parse_input_value("45"), Some(45.0));
        assert_eq!(parse_input_value(" 12.5 "), Some(12.5));
        assert_eq!(parse_input_value(""), None);
        assert_eq!(parse_input_value("abc"), None);
        assert_eq!(parse_input_value("NaN"), None);
    }
}
