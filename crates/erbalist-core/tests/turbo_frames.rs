mod common;

use common::{FoldMode, MockHost};
use erbalist_core::{
    ContextTarget, DecorationGroup, DocumentId, Engine, ErbalistError, LineRange, Scanner,
    SelectionKind, Span, SpanKind, link, resolve_context,
};
use pretty_assertions::assert_eq;

const FRAME_DOC: &str = "<%= turbo_frame_tag \"cart\" do %>\n  <p>item</p>\n<% end %>\n<a data-turbo-frame=\"cart\">x</a>";

fn frame_engine(mode: FoldMode) -> (Engine<MockHost>, DocumentId) {
    let mut host = MockHost::default();
    host.fold_mode = mode;
    let doc = host.open("app/views/carts/show.html.erb", FRAME_DOC, 0);
    (Engine::new(host).unwrap(), doc)
}

fn move_to(engine: &mut Engine<MockHost>, doc: &DocumentId, cursor: usize) {
    engine.host_mut().move_cursor(doc, cursor);
    engine.on_cursor_moved(doc, SelectionKind::Keyboard);
}

fn frame_painted(engine: &Engine<MockHost>, doc: &DocumentId) -> bool {
    engine
        .host()
        .paint
        .contains_key(&(doc.clone(), DecorationGroup::TurboFrame))
}

#[test]
fn test_duplicate_declarations_and_reference_all_link() {
    let text = r#"<%= turbo_frame_tag "cart" %>
<turbo-frame id="cart"></turbo-frame>
<%= link_to "Add", add_path, data: { turbo_frame: "cart" } %>
<%= turbo_frame_tag "wishlist" %>"#;
    let spans: Vec<Span> = Scanner::new()
        .unwrap()
        .scan_kinds(
            text,
            &[SpanKind::NamedScopeDeclaration, SpanKind::NamedScopeReference],
        )
        .collect();
    assert_eq!(spans.len(), 4);

    let cursor = text.find("\"cart\"").unwrap() + 2;
    let context = resolve_context(&spans, cursor, ContextTarget::Frame);
    let linked = link(&spans, &context);
    let kinds: Vec<SpanKind> = linked.spans.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SpanKind::NamedScopeDeclaration,
            SpanKind::NamedScopeDeclaration,
            SpanKind::NamedScopeReference
        ]
    );
}

#[test]
fn test_frame_ids_compare_normalized() {
    let text = r#"<turbo-frame id="My-Widget"></turbo-frame><a data-turbo-frame="my_widget">x</a>"#;
    let spans: Vec<Span> = Scanner::new()
        .unwrap()
        .scan_kinds(
            text,
            &[SpanKind::NamedScopeDeclaration, SpanKind::NamedScopeReference],
        )
        .collect();
    let context = resolve_context(&spans, text.find("my_widget").unwrap(), ContextTarget::Frame);
    assert_eq!(link(&spans, &context).spans.len(), 2);
}

#[test]
fn test_enclosing_frame_is_found_by_indentation() {
    let (mut engine, doc) = frame_engine(FoldMode::Ready(Vec::new()));
    move_to(&mut engine, &doc, FRAME_DOC.find("item").unwrap());

    let host = engine.host();
    assert_eq!(
        host.painted(&doc, DecorationGroup::TurboFrame),
        vec![
            "turbo_frame_tag \"cart\"".to_string(),
            "data-turbo-frame=\"cart\"".to_string()
        ]
    );
    assert_eq!(
        host.painted(&doc, DecorationGroup::TurboFrameScope),
        vec!["<%= turbo_frame_tag \"cart\" do %>\n  <p>item</p>\n<% end %>".to_string()]
    );
    assert!(DecorationGroup::TurboFrameScope.is_whole_line());
}

#[test]
fn test_cursor_outside_any_frame_paints_nothing() {
    let (mut engine, doc) = frame_engine(FoldMode::Ready(Vec::new()));
    move_to(&mut engine, &doc, FRAME_DOC.find("x</a>").unwrap());
    assert!(engine.host().painted(&doc, DecorationGroup::TurboFrame).is_empty());
    assert!(
        engine
            .host()
            .painted(&doc, DecorationGroup::TurboFrameScope)
            .is_empty()
    );
}

#[test]
fn test_structural_ranges_bound_the_scope() {
    let (mut engine, doc) = frame_engine(FoldMode::Ready(vec![LineRange::new(0, 1)]));
    move_to(&mut engine, &doc, FRAME_DOC.find("item").unwrap());
    assert_eq!(
        engine.host().painted(&doc, DecorationGroup::TurboFrameScope),
        vec!["<%= turbo_frame_tag \"cart\" do %>\n  <p>item</p>".to_string()]
    );
}

#[test]
fn test_host_failure_falls_back_to_indentation() {
    let (mut engine, doc) = frame_engine(FoldMode::Fail);
    move_to(&mut engine, &doc, FRAME_DOC.find("item").unwrap());
    assert_eq!(
        engine.host().painted(&doc, DecorationGroup::TurboFrameScope).len(),
        1
    );
    assert!(engine.document_state(&doc).unwrap().pending.is_none());
}

#[test]
fn test_stale_fold_ranges_are_discarded() {
    let (mut engine, doc) = frame_engine(FoldMode::Pending);
    let item = FRAME_DOC.find("item").unwrap();
    move_to(&mut engine, &doc, item);
    move_to(&mut engine, &doc, item + 1);
    assert_eq!(engine.host().requests.len(), 2);
    assert!(!frame_painted(&engine, &doc));

    let first = engine.host().requests[0].clone();
    let second = engine.host().requests[1].clone();
    assert!(first.generation < second.generation);

    engine.complete_fold_ranges(first, Ok(vec![LineRange::new(0, 2)]));
    assert!(!frame_painted(&engine, &doc));

    engine.complete_fold_ranges(second.clone(), Ok(vec![LineRange::new(0, 2)]));
    assert_eq!(
        engine.host().painted(&doc, DecorationGroup::TurboFrame).len(),
        2
    );

    // A duplicate delivery is stale too.
    let calls = engine.host().paint_calls;
    engine.complete_fold_ranges(second, Ok(Vec::new()));
    assert_eq!(engine.host().paint_calls, calls);
}

#[test]
fn test_failed_completion_uses_indentation() {
    let (mut engine, doc) = frame_engine(FoldMode::Pending);
    move_to(&mut engine, &doc, FRAME_DOC.find("item").unwrap());
    let request = engine.host().requests[0].clone();
    engine.complete_fold_ranges(
        request,
        Err(ErbalistError::HostUnavailable("timeout".to_string())),
    );
    assert_eq!(
        engine.host().painted(&doc, DecorationGroup::TurboFrameScope),
        vec!["<%= turbo_frame_tag \"cart\" do %>\n  <p>item</p>\n<% end %>".to_string()]
    );
}

#[test]
fn test_completion_after_toggle_off_is_discarded() {
    let (mut engine, doc) = frame_engine(FoldMode::Pending);
    move_to(&mut engine, &doc, FRAME_DOC.find("item").unwrap());
    let request = engine.host().requests[0].clone();

    assert_eq!(engine.toggle_turbo_frames(&doc), Some(false));
    assert_eq!(engine.host().flag("erbalist.turboFramesEnabled"), Some(false));
    engine.complete_fold_ranges(request, Ok(vec![LineRange::new(0, 2)]));
    assert!(engine.host().painted(&doc, DecorationGroup::TurboFrame).is_empty());
}

#[test]
fn test_switching_documents_drops_pending_results() {
    let mut host = MockHost::default();
    host.fold_mode = FoldMode::Pending;
    let cursor = FRAME_DOC.find("item").unwrap();
    let a = host.open("a.html.erb", FRAME_DOC, cursor);
    let b = host.open("b.html.erb", "<p></p>", 0);
    let mut engine = Engine::new(host).unwrap();

    engine.on_active_document_changed(Some(&a));
    let request = engine.host().requests[0].clone();
    assert_eq!(request.document, a);

    engine.on_active_document_changed(Some(&b));
    assert_eq!(engine.active_document(), Some(&b));
    assert!(engine.document_state(&a).unwrap().pending.is_none());

    engine.complete_fold_ranges(request, Ok(Vec::new()));
    assert!(!frame_painted(&engine, &a));
}

#[test]
fn test_completion_for_closed_document_is_discarded() {
    let (mut engine, doc) = frame_engine(FoldMode::Pending);
    move_to(&mut engine, &doc, FRAME_DOC.find("item").unwrap());
    let request = engine.host().requests[0].clone();

    engine.host_mut().close(&doc);
    engine.on_document_closed(&doc);
    engine.complete_fold_ranges(request, Ok(Vec::new()));
    assert!(!frame_painted(&engine, &doc));
}
