use dropship::ProjectNames;
use dropship::names::{project_name, sanitize};

#[test]
fn sanitized_names_use_allowed_characters_only() {
    for input in ["Widget", "my app", "tab\tname", "ümlaut", "a/b:c", "--x--", "123"] {
        let out = sanitize(input);
        assert!(!out.is_empty());
        assert!(
            out.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.-".contains(c)),
            "{input:?} -> {out:?}"
        );
    }
}

#[test]
fn sanitize_twice_changes_nothing() {
    for input in ["Widget", "my app", "ÄÖÜ", "", "x.Y_z"] {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn names_from_scp_url() {
    let names = ProjectNames::from_repo_url("git@github.com:acme/Blog.git");

    assert_eq!(names.project, "Blog");
    assert_eq!(names.sanitized, "blog");
    assert_eq!(names.remote_dir(), "deploy_Blog");
    assert_eq!(names.image_tag(), "blog:latest");
}

#[test]
fn local_path_repository() {
    assert_eq!(project_name("/srv/repos/tool.git"), "tool");
}
