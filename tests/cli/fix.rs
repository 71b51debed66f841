use anyhow::Result;

use crate::{CliTest, run};

const SERVICE: &str = r#"class Service
{
    void Run(int id)
    {
        Log("user {0}", $"id {id}");
        Audit(entry: $"visited {id}");
    }

    void Log(string format, params object[] args) { }
    void Audit(object entry) { }
}
"#;

#[test]
fn test_fix_dry_run() -> Result<()> {
    let test = CliTest::with_file("Service.cs", SERVICE)?.with_git_root()?;

    let output = run(test.fix_command())?;

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("--> ./Service.cs"));
    assert!(
        output
            .stdout
            .contains("+         Log(\"user {0}\", (FormattableString)$\"id {id}\");")
    );
    assert!(output.stdout.contains("Would insert 2 cast(s) in 1 file(s)."));
    assert_eq!(test.read_file("Service.cs")?, SERVICE);

    Ok(())
}

#[test]
fn test_fix_apply() -> Result<()> {
    let test = CliTest::with_file("Service.cs", SERVICE)?.with_git_root()?;

    let mut cmd = test.fix_command();
    cmd.arg("--apply");
    let output = run(cmd)?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("Inserted 2 cast(s) in 1 file(s)."));

    let expected = SERVICE
        .replace(
            "Log(\"user {0}\", $\"id {id}\")",
            "Log(\"user {0}\", (FormattableString)$\"id {id}\")",
        )
        .replace(
            "Audit(entry: $\"visited {id}\")",
            "Audit(entry: (FormattableString)$\"visited {id}\")",
        );
    assert_eq!(test.read_file("Service.cs")?, expected);

    // A second run has nothing left to do
    let output = run(test.check_command())?;
    assert_eq!(output.code, Some(0));

    Ok(())
}

#[test]
fn test_fix_nothing_to_do() -> Result<()> {
    let test = CliTest::with_file("App.cs", "class App { void M() { } }")?.with_git_root()?;

    let output = run(test.fix_command())?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("no issues found"));

    Ok(())
}
