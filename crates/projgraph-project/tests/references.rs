//! Metadata, project, and analyzer references, including conversion of
//! metadata references that point at another project's output.

mod common;

use projgraph_core::{DocumentCollection, MetadataReference, ProjectReference, ReferenceProperties, SourceCodeKind};
use projgraph_project::ProjectError;

use common::harness;

#[test]
fn reference_to_project_output_becomes_project_reference() {
    let h = harness();
    let app = h.project("App");
    let lib = h.project_with_output("Lib", "bin/Lib.dll");

    app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    let state = app.committed_state().unwrap();
    assert!(state.metadata_references().is_empty());
    assert_eq!(state.project_references(), &[ProjectReference::new(lib.id())]);
    assert!(app.contains_metadata_reference("bin/Lib.dll", &ReferenceProperties::assembly()));
    // The facade tracks the metadata reference, not a direct project reference.
    assert!(!app.contains_project_reference(lib.id()));

    app.remove_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    assert!(app.committed_state().unwrap().project_references().is_empty());
}

#[test]
fn same_path_with_different_properties_coexist() {
    let h = harness();
    let app = h.project("App");
    let p1 = ReferenceProperties::assembly();
    let p2 = ReferenceProperties::assembly().with_aliases(["X"]);

    app.add_metadata_reference("libX.dll", p1.clone()).unwrap();
    app.add_metadata_reference("libX.dll", p2.clone()).unwrap();
    assert!(matches!(
        app.add_metadata_reference("libX.dll", p1.clone()),
        Err(ProjectError::DuplicateEntry(_))
    ));

    app.remove_metadata_reference("libX.dll", p1.clone()).unwrap();
    assert!(!app.contains_metadata_reference("libX.dll", &p1));
    assert!(app.contains_metadata_reference("libX.dll", &p2));
    assert_eq!(
        app.committed_state().unwrap().metadata_references(),
        &[MetadataReference::new("libX.dll", p2)]
    );
}

#[test]
fn batched_reference_sees_late_output_registration() {
    let h = harness();
    let app = h.project("App");
    let lib = h.project("Lib");

    let scope = app.begin_batch().unwrap();
    app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly().with_embed_interop_types(true))
        .unwrap();
    // Registered after the add, before the flush.
    lib.set_output_file_path(Some("bin/Lib.dll".into())).unwrap();
    scope.release().unwrap();

    let state = app.committed_state().unwrap();
    assert!(state.metadata_references().is_empty());
    assert_eq!(state.project_references().len(), 1);
    assert_eq!(state.project_references()[0].project_id, lib.id());
    assert!(state.project_references()[0].embed_interop_types);
}

#[test]
fn output_path_change_updates_index_inside_batch() {
    let h = harness();
    let lib = h.project_with_output("Lib", "bin/Old.dll");
    let scope = lib.begin_batch().unwrap();
    lib.set_output_file_path(Some("bin/New.dll".into())).unwrap();

    let index = h.workspace.output_paths();
    assert_eq!(index.find_owning_project("bin/New.dll"), Some(lib.id()));
    assert_eq!(index.find_owning_project("bin/Old.dll"), None);
    assert_eq!(lib.committed_state().unwrap().output_file_path.as_deref(), Some("bin/Old.dll"));
    scope.release().unwrap();
    assert_eq!(lib.committed_state().unwrap().output_file_path.as_deref(), Some("bin/New.dll"));
}

#[test]
fn shared_output_and_ref_paths_stay_registered() {
    let h = harness();
    let lib = h.project_with_output("Lib", "bin/Lib.dll");
    lib.set_output_ref_file_path(Some("bin/Lib.dll".into())).unwrap();
    lib.set_output_ref_file_path(Some("ref/Lib.dll".into())).unwrap();
    assert_eq!(h.workspace.output_paths().find_owning_project("bin/Lib.dll"), Some(lib.id()));
    assert_eq!(h.workspace.output_paths().find_owning_project("ref/Lib.dll"), Some(lib.id()));
}

#[test]
fn removal_after_output_registration_changed_is_lenient() {
    let h = harness();
    let app = h.project("App");
    let lib = h.project("Lib");

    app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    lib.set_output_file_path(Some("bin/Lib.dll".into())).unwrap();
    app.add_project_reference(ProjectReference::new(lib.id())).unwrap();

    // Reconciles as structural now; the committed content-bearing reference
    // and the direct edge are both left alone.
    app.remove_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    assert!(!app.contains_metadata_reference("bin/Lib.dll", &ReferenceProperties::assembly()));
    let state = app.committed_state().unwrap();
    assert_eq!(state.metadata_references().len(), 1);
    assert_eq!(state.project_references(), &[ProjectReference::new(lib.id())]);
}

#[test]
fn modules_and_own_output_stay_content_bearing() {
    let h = harness();
    let lib = h.project_with_output("Lib", "bin/Lib.dll");
    let app = h.project("App");

    app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::module())
        .unwrap();
    lib.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    assert_eq!(app.committed_state().unwrap().metadata_references().len(), 1);
    assert_eq!(lib.committed_state().unwrap().metadata_references().len(), 1);
    assert!(lib.committed_state().unwrap().project_references().is_empty());
}

#[test]
fn conversion_that_would_cycle_is_kept_as_metadata() {
    let h = harness();
    let app = h.project_with_output("App", "bin/App.dll");
    let lib = h.project("Lib");
    app.add_project_reference(ProjectReference::new(lib.id())).unwrap();

    lib.add_metadata_reference("bin/App.dll", ReferenceProperties::assembly())
        .unwrap();
    let state = lib.committed_state().unwrap();
    assert!(state.project_references().is_empty());
    assert_eq!(state.metadata_references().len(), 1);
}

#[test]
fn project_references_reject_cycles_and_duplicates() {
    let h = harness();
    let a = h.project("A");
    let b = h.project("B");
    let c = h.project("C");
    a.add_project_reference(ProjectReference::new(b.id())).unwrap();
    b.add_project_reference(ProjectReference::new(c.id())).unwrap();

    let before = h.store.transition_count();
    assert!(matches!(
        c.add_project_reference(ProjectReference::new(a.id())),
        Err(ProjectError::InvalidArgument(_))
    ));
    assert!(matches!(
        a.add_project_reference(ProjectReference::new(b.id())),
        Err(ProjectError::DuplicateEntry(_))
    ));
    assert!(matches!(
        a.remove_project_reference(c.id()),
        Err(ProjectError::NotFound(_))
    ));
    assert_eq!(h.store.transition_count(), before);
    assert!(!c.contains_project_reference(a.id()));

    a.remove_project_reference(b.id()).unwrap();
    assert!(a.project_references().is_empty());
}

#[test]
fn batched_project_reference_add_and_remove_cancel() {
    let h = harness();
    let a = h.project("A");
    let b = h.project("B");
    let before = h.store.transition_count();

    let scope = a.begin_batch().unwrap();
    a.add_project_reference(ProjectReference::new(b.id())).unwrap();
    a.remove_project_reference(b.id()).unwrap();
    scope.release().unwrap();
    assert_eq!(h.store.transition_count(), before);
}

#[test]
fn direct_reference_outlives_converted_reference_to_same_project() {
    let h = harness();
    let app = h.project("App");
    let lib = h.project_with_output("Lib", "bin/Lib.dll");
    let edge = ProjectReference::new(lib.id());

    app.add_project_reference(edge.clone()).unwrap();
    app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    app.remove_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();

    assert!(app.contains_project_reference(lib.id()));
    assert_eq!(app.committed_state().unwrap().project_references(), &[edge]);
    app.remove_project_reference(lib.id()).unwrap();
    assert!(app.committed_state().unwrap().project_references().is_empty());
}

#[test]
fn converted_reference_outlives_direct_reference_to_same_project() {
    let h = harness();
    let app = h.project("App");
    let lib = h.project_with_output("Lib", "bin/Lib.dll");
    let edge = ProjectReference::new(lib.id());

    app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    app.add_project_reference(edge.clone()).unwrap();
    assert_eq!(app.committed_state().unwrap().project_references(), &[edge.clone()]);

    app.remove_project_reference(lib.id()).unwrap();
    assert_eq!(app.committed_state().unwrap().project_references(), &[edge]);
    app.remove_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
        .unwrap();
    assert!(app.committed_state().unwrap().project_references().is_empty());
}

#[test]
fn batched_converted_and_direct_reference_to_same_project_flush() {
    for converted_first in [true, false] {
        let h = harness();
        let app = h.project("App");
        let lib = h.project_with_output("Lib", "bin/Lib.dll");
        let edge = ProjectReference::new(lib.id());

        let scope = app.begin_batch().unwrap();
        if converted_first {
            app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
                .unwrap();
            app.add_project_reference(edge.clone()).unwrap();
        } else {
            app.add_project_reference(edge.clone()).unwrap();
            app.add_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
                .unwrap();
        }
        app.add_source_file("a.cs", SourceCodeKind::Regular, &[]).unwrap();
        scope.release().unwrap();

        let state = app.committed_state().unwrap();
        assert_eq!(state.project_references(), &[edge.clone()]);
        assert_eq!(state.documents(DocumentCollection::Source).len(), 1);

        let scope = app.begin_batch().unwrap();
        app.remove_metadata_reference("bin/Lib.dll", ReferenceProperties::assembly())
            .unwrap();
        scope.release().unwrap();
        assert_eq!(app.committed_state().unwrap().project_references(), &[edge.clone()]);

        app.remove_project_reference(lib.id()).unwrap();
        assert!(app.committed_state().unwrap().project_references().is_empty());
    }
}

#[test]
fn analyzer_references() {
    let h = harness();
    let app = h.project("App");
    app.add_analyzer_reference("an/Style.dll").unwrap();
    assert!(matches!(
        app.add_analyzer_reference("an/Style.dll"),
        Err(ProjectError::DuplicateEntry(_))
    ));
    assert!(app.contains_analyzer_reference("an/Style.dll"));
    app.remove_analyzer_reference("an/Style.dll").unwrap();
    assert!(matches!(
        app.remove_analyzer_reference("an/Style.dll"),
        Err(ProjectError::NotFound(_))
    ));
    assert!(app.analyzer_references().is_empty());
    assert!(app.committed_state().unwrap().analyzer_references().is_empty());
}
