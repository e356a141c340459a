use scrumdesk::board::{self, Board, BoardExporter};
use scrumdesk::loader;
use scrumdesk::store::{IndexList, BACKLOG};
use scrumdesk::{
    Console, Dispatcher, Document, ResourceKind, ResourceStore, Status, WindowEngine,
};
use std::io::Cursor;
use std::path::{Path, PathBuf};

struct NullExporter;

impl BoardExporter for NullExporter {
    fn export(&mut self, _boards: &[Board]) -> scrumdesk::Result<()> {
        Ok(())
    }
}

fn data_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

/// Run the shipped window table against scripted input
fn session(doc: &mut Document, input: &str) -> String {
    let mut engine = WindowEngine::new(Dispatcher::new(Box::new(NullExporter)));
    let mut console = Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    engine
        .run(&doc.windows, &mut doc.store, &mut console)
        .unwrap();
    let (_, out) = console.into_inner();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_shipped_document_loads() {
    let doc = Document::load(&data_file("scrum.json")).unwrap();
    assert!(doc.windows.len() > 10);
    assert!(doc.store.projects().is_empty());
    assert!(!doc.formats.is_null());
}

#[test]
fn test_add_story_task_then_delete_story() {
    let mut doc = Document::load(&data_file("scrum.json")).unwrap();
    let script = [
        "1", "Website", // add project
        "0", "0", // open it
        "1", "Launch", // add story
        "0", "1", // open Launch (Backlog comes first)
        "1", "Buy domain", // add task
        "2", // delete story, back to the project menu
        "9",
    ]
    .join("\n");
    let out = session(&mut doc, &script);
    let store = &doc.store;

    assert!(out.contains("\nProject: Website\n----------------\n"));
    assert!(out.contains("\nStory: Launch\n"));

    assert_eq!(store.project_paths().len(), 1);
    let project = store.project_paths()[0].clone();
    let stories: Vec<_> = store.stories_of(&project).collect();
    assert_eq!(stories.len(), 1);
    assert_eq!(store.text(stories[0]), Some(BACKLOG));
    assert!(store.task_paths().is_empty());
    store.check_consistency().unwrap();

    let verbs: Vec<String> = store
        .log()
        .iter()
        .map(|entry| entry.split(" projects.").next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        verbs,
        vec![
            "Added Project",
            "Added Story",
            "Added Story",
            "Added Task",
            "Deleted Task",
            "Deleted Story",
        ]
    );
}

#[test]
fn test_stray_byte_does_not_end_session() {
    let mut doc = Document::load(&data_file("scrum.json")).unwrap();
    let mut engine = WindowEngine::new(Dispatcher::new(Box::new(NullExporter)));
    let mut input = b"1\nWebsite\n".to_vec();
    input.extend_from_slice(b"\xff\n9\n");
    let mut console = Console::new(Cursor::new(input), Vec::new());

    engine
        .run(&doc.windows, &mut doc.store, &mut console)
        .unwrap();
    assert_eq!(doc.store.project_paths().len(), 1);
}

#[test]
fn test_edit_task_status_through_menus() {
    let mut doc = Document::load(&data_file("scrum.json")).unwrap();
    let backlog = {
        doc.store.insert_project("Website");
        doc.store.story_paths()[0].clone()
    };
    let task = doc
        .store
        .insert_task(&backlog, "Buy domain", Status::ToDo)
        .unwrap();

    // project, story and task each get a menu line; find the task's
    let listing = session(&mut doc.clone(), "2\n");
    let index = listing
        .lines()
        .find(|l| l.ends_with(": Website.Backlog.Buy domain"))
        .and_then(|l| l.split(':').next())
        .unwrap()
        .to_string();

    let script = format!("2\n{}\n1\nreview\n9\n", index);
    session(&mut doc, &script);
    assert_eq!(doc.store.task(&task).unwrap().status, Status::Review);
    assert!(doc.store.log().last().unwrap().contains(".status to Review"));
}

#[test]
fn test_bulk_load_from_menu() {
    let mut doc = Document::load(&data_file("scrum.json")).unwrap();
    let outline = data_file("example_outline.txt");
    let out = session(&mut doc, &format!("6\n{}\n5\n9\n", outline.display()));

    assert!(!out.contains("Error:"));
    assert_eq!(doc.store.project_paths().len(), 2);
    assert!(out.contains("\t\tCOMPLETE: Buy domain\n"));
    assert!(out.contains("\t\tREVIEW: Order seeds\n"));
    doc.store.check_consistency().unwrap();
}

#[test]
fn test_outline_boards() {
    let mut store = ResourceStore::new();
    let mut out = Vec::new();
    let report = loader::load_file(&data_file("example_outline.txt"), &mut store, &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(report.projects, 2);
    assert_eq!(report.tasks, 6);

    let boards = board::format(&store, store.project_paths());
    assert_eq!(boards.len(), 2);

    let website = &boards[0];
    assert_eq!(website.project, "Website");
    // Backlog then Launch, one row each
    assert_eq!(website.story_rows().len(), 2);
    assert_eq!(website.story_rows()[0][0], "Backlog");
    assert_eq!(website.story_rows()[0][1], "Blog section");
    let launch = &website.story_rows()[1];
    assert_eq!(launch[0], "Launch");
    assert_eq!(launch[2], "Write landing copy");
    assert_eq!(launch[4], "Set up hosting");
    assert_eq!(launch[5], "Buy domain");

    let garden = &boards[1];
    assert_eq!(garden.story_rows().len(), 1);
    assert_eq!(garden.story_rows()[0][3], "Order seeds");
}

#[test]
fn test_outline_scenario() {
    let mut store = ResourceStore::new();
    let mut out = Vec::new();
    loader::load_str("Website\n\tLaunch\n\t\tBuy domain - T\n", &mut store, &mut out).unwrap();

    assert_eq!(store.index(IndexList::ProjectPaths).len(), 1);
    let launch = store
        .find_first_match(ResourceKind::Story, None, "Launch")
        .unwrap();
    let task = store
        .find_first_match(ResourceKind::Task, Some(&launch), "Buy domain")
        .unwrap();
    let task = store.task(&task).unwrap();
    assert_eq!(task.text, "Buy domain");
    assert_eq!(task.status, Status::ToDo);
}

#[test]
fn test_save_and_reload_session_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("team.yaml");

    let mut doc = Document::load(&data_file("scrum.json")).unwrap();
    session(&mut doc, "1\nWebsite\n9\n");
    doc.save(&path).unwrap();

    let reloaded = Document::load(&path).unwrap();
    assert_eq!(reloaded.store, doc.store);
    assert_eq!(reloaded.windows, doc.windows);
    assert_eq!(reloaded.parameters, doc.parameters);
}
