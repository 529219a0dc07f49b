//! E2E Scenario: a multi-file bundle installs as a directory tree.

use super::fixture::E2EFixture;

#[test]
fn test_bundle_installs_full_tree() {
    let mut fixture = E2EFixture::new("bundle_installs_full_tree");

    fixture.log_step("Publish a bundle with nested files");
    let source = fixture.temp_dir.path().join("bundle-src");
    fixture.write_file(&source.join("SKILL.md"), "# deploy\n");
    fixture.write_file(&source.join("scripts/run.sh"), "echo deploy\n");
    fixture.write_file(&source.join("refs/checklist.md"), "- [ ] ship\n");
    fixture
        .registry
        .publish_bundle("deploy", "0.4.0", &source)
        .unwrap();

    fixture.log_step("Install it");
    fixture.assert_success(&fixture.run_skill(&["init"]), "init");
    fixture.assert_success(&fixture.run_skill(&["add", "deploy", "~0.4"]), "add");
    fixture.assert_success(&fixture.run_skill(&["install"]), "install");

    fixture.log_step("Every file of the bundle is present");
    assert_eq!(fixture.read_vendor("deploy/SKILL.md"), "# deploy\n");
    assert_eq!(fixture.read_vendor("deploy/scripts/run.sh"), "echo deploy\n");
    assert_eq!(fixture.read_vendor("deploy/refs/checklist.md"), "- [ ] ship\n");

    fixture.log_step("Status sees an intact install");
    let (output, value) = fixture.run_json(&["status"]);
    fixture.assert_success(&output, "status");
    assert_eq!(value["data"]["skills"][0]["state"], "installed");
    assert_eq!(value["data"]["skills"][0]["cached"], true);
}
