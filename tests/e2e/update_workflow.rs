//! E2E Scenario: new releases, version bumps and removals.

use super::fixture::E2EFixture;

#[test]
fn test_lockfile_holds_versions_until_manifest_changes() {
    let mut fixture = E2EFixture::new("lockfile_holds_versions");
    fixture.registry.publish("alpha", "1.0.0", "# 1.0\n").unwrap();
    fixture.assert_success(&fixture.run_skill(&["init"]), "init");
    fixture.assert_success(&fixture.run_skill(&["add", "alpha", "^1"]), "add");
    fixture.assert_success(&fixture.run_skill(&["install"]), "install");

    fixture.log_step("A newer compatible release does not move the lock");
    fixture.registry.publish("alpha", "1.1.0", "# 1.1\n").unwrap();
    fixture.assert_success(&fixture.run_skill(&["install"]), "install");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# 1.0\n");

    fixture.log_step("An explicit lock picks it up");
    let (output, value) = fixture.run_json(&["lock"]);
    fixture.assert_success(&output, "lock");
    assert_eq!(value["data"]["written"], true);
    assert_eq!(value["data"]["skills"][0]["version"], "1.1.0");

    let (output, value) = fixture.run_json(&["install"]);
    fixture.assert_success(&output, "install");
    assert_eq!(value["data"]["report"]["updated"][0]["from"], "1.0.0");
    assert_eq!(value["data"]["report"]["updated"][0]["to"], "1.1.0");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# 1.1\n");
}

#[test]
fn test_bump_and_remove() {
    let mut fixture = E2EFixture::new("bump_and_remove");
    fixture.registry.publish("alpha", "1.0.0", "# a1\n").unwrap();
    fixture.registry.publish("alpha", "2.0.0", "# a2\n").unwrap();
    fixture.registry.publish("beta", "1.0.0", "# b1\n").unwrap();
    fixture.assert_success(&fixture.run_skill(&["init"]), "init");
    fixture.assert_success(&fixture.run_skill(&["add", "alpha", "1.0.0"]), "add alpha");
    fixture.assert_success(&fixture.run_skill(&["add", "beta"]), "add beta");
    fixture.assert_success(&fixture.run_skill(&["install"]), "install");

    fixture.log_step("Bump alpha and drop beta");
    fixture.assert_success(&fixture.run_skill(&["add", "alpha", "2.0.0"]), "bump alpha");
    fixture.assert_success(&fixture.run_skill(&["remove", "beta"]), "remove beta");

    let (output, value) = fixture.run_json(&["install"]);
    fixture.assert_success(&output, "install");
    let report = &value["data"]["report"];
    assert_eq!(report["updated"][0]["name"], "alpha");
    assert_eq!(report["removed"][0]["name"], "beta");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# a2\n");
    assert!(!fixture.vendor_path("beta").exists());

    let lockfile = std::fs::read_to_string(fixture.root.join("skill.lock")).unwrap();
    assert!(!lockfile.contains("beta"));
}

#[test]
fn test_yanked_release_is_skipped_by_ranges() {
    let mut fixture = E2EFixture::new("yanked_release");
    fixture.registry.publish("alpha", "1.0.0", "# 1.0\n").unwrap();
    fixture.registry.publish("alpha", "1.1.0", "# 1.1\n").unwrap();
    fixture.registry.yank("alpha", "1.1.0").unwrap();

    fixture.assert_success(&fixture.run_skill(&["init"]), "init");
    fixture.assert_success(&fixture.run_skill(&["add", "alpha", "^1"]), "add");

    fixture.log_step("Range resolution ignores the yanked version");
    let (output, value) = fixture.run_json(&["lock"]);
    fixture.assert_success(&output, "lock");
    assert_eq!(value["data"]["skills"][0]["version"], "1.0.0");

    fixture.log_step("versions hides it too");
    let output = fixture.run_skill(&["-O", "plain", "versions", "alpha"]);
    fixture.assert_success(&output, "versions");
    assert_eq!(output.stdout, "1.0.0\n");
}
