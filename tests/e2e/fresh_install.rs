//! E2E Scenario: fresh project to installed skills.

use super::fixture::E2EFixture;

#[test]
fn test_fresh_project_to_installed_skills() {
    let mut fixture = E2EFixture::new("fresh_project_to_installed_skills");
    fixture.registry.publish("alpha", "1.0.0", "# alpha 1.0\n").unwrap();
    fixture.registry.publish("alpha", "1.2.0", "# alpha 1.2\n").unwrap();
    fixture.registry.publish("alpha", "2.0.0", "# alpha 2.0\n").unwrap();
    fixture.registry.publish("beta", "0.1.0", "# beta\n").unwrap();

    fixture.log_step("Initialize project");
    let output = fixture.run_skill(&["init"]);
    fixture.assert_success(&output, "init");

    fixture.log_step("Require alpha ^1.0.0 and the latest beta");
    let output = fixture.run_skill(&["add", "alpha", "^1.0.0"]);
    fixture.assert_success(&output, "add alpha");
    let output = fixture.run_skill(&["add", "beta"]);
    fixture.assert_success(&output, "add beta");

    fixture.log_step("Install resolves and writes the lockfile");
    let (output, value) = fixture.run_json(&["install"]);
    fixture.assert_success(&output, "install");
    assert_eq!(value["data"]["lockfile_written"], true);
    let installed = value["data"]["report"]["installed"].as_array().unwrap();
    let names: Vec<&str> = installed.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(installed[0]["version"], "1.2.0");

    fixture.log_step("Vendored files match the registry artifacts");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# alpha 1.2\n");
    assert_eq!(fixture.read_vendor("beta/SKILL.md"), "# beta\n");
    let record = fixture.read_vendor("alpha/.skill-record.json");
    assert!(record.contains("\"1.2.0\""));

    fixture.log_step("A second install changes nothing");
    let lock_before = std::fs::read(fixture.root.join("skill.lock")).unwrap();
    let (output, value) = fixture.run_json(&["install"]);
    fixture.assert_success(&output, "second install");
    assert_eq!(value["data"]["report"]["unchanged"].as_array().unwrap().len(), 2);
    assert_eq!(std::fs::read(fixture.root.join("skill.lock")).unwrap(), lock_before);
}

#[test]
fn test_conflicting_requirements_fail_before_any_change() {
    let mut fixture = E2EFixture::new("conflicting_requirements");
    fixture.registry.publish("alpha", "1.0.0", "# 1\n").unwrap();
    fixture.registry.publish("alpha", "2.0.0", "# 2\n").unwrap();

    fixture.log_step("Write a manifest that pins alpha twice");
    fixture.write_file(
        &fixture.root.join("skill.toml"),
        "version = 1\n\n[[skill]]\nname = \"alpha\"\nversion = \"1.0.0\"\n\n[[skill]]\nname = \"alpha\"\nversion = \"2.0.0\"\n",
    );

    fixture.log_step("Lock reports the conflict");
    let (output, value) = fixture.run_json(&["lock"]);
    assert!(!output.success);
    assert_eq!(value["status"]["error"]["code"], "CONSTRAINT_CONFLICT");
    assert!(!fixture.root.join("skill.lock").exists());
    assert!(!fixture.vendor_path("alpha").exists());
}
