//! E2E Scenario: edits inside the vendor directory.

use super::fixture::E2EFixture;

#[test]
fn test_modified_skill_is_reported_and_force_restores_it() {
    let mut fixture = E2EFixture::new("modified_skill_restored_by_force");
    fixture.registry.publish("alpha", "1.0.0", "# alpha\n").unwrap();
    fixture.assert_success(&fixture.run_skill(&["init"]), "init");
    fixture.assert_success(&fixture.run_skill(&["add", "alpha"]), "add");
    fixture.assert_success(&fixture.run_skill(&["install"]), "install");

    fixture.log_step("Edit the vendored copy");
    fixture.write_file(&fixture.vendor_path("alpha/SKILL.md"), "# my local notes\n");

    fixture.log_step("Status reports the edit");
    let (_, value) = fixture.run_json(&["status"]);
    assert_eq!(value["data"]["skills"][0]["state"], "modified");
    let output = fixture.run_skill(&["status", "--check"]);
    assert_eq!(output.exit_code, 1);

    fixture.log_step("A plain install leaves the edit alone");
    fixture.assert_success(&fixture.run_skill(&["install"]), "install");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# my local notes\n");

    fixture.log_step("install --force restores the registry copy");
    let (output, value) = fixture.run_json(&["install", "--force"]);
    fixture.assert_success(&output, "install --force");
    assert_eq!(value["data"]["report"]["updated"][0]["name"], "alpha");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# alpha\n");
}

#[test]
fn test_unmanaged_directory_is_never_overwritten_silently() {
    let mut fixture = E2EFixture::new("unmanaged_directory");
    fixture.registry.publish("alpha", "1.0.0", "# alpha\n").unwrap();
    fixture.assert_success(&fixture.run_skill(&["init"]), "init");
    fixture.assert_success(&fixture.run_skill(&["add", "alpha"]), "add");

    fixture.log_step("Hand-written skills share the vendor directory");
    fixture.write_file(&fixture.vendor_path("alpha/SKILL.md"), "# hand written\n");
    fixture.write_file(&fixture.vendor_path("mine/SKILL.md"), "# mine\n");

    fixture.log_step("Install refuses to replace the unmanaged alpha");
    let (output, value) = fixture.run_json(&["install"]);
    assert_eq!(output.exit_code, 1);
    assert_eq!(value["data"]["report"]["failed"][0]["code"], "VALIDATION_FAILED");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# hand written\n");

    fixture.log_step("--force takes it over; the other directory is untouched");
    fixture.assert_success(&fixture.run_skill(&["install", "--force"]), "install --force");
    assert_eq!(fixture.read_vendor("alpha/SKILL.md"), "# alpha\n");
    assert_eq!(fixture.read_vendor("mine/SKILL.md"), "# mine\n");
}
