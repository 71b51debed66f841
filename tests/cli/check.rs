use anyhow::Result;

use crate::{CliTest, run};

const PROGRAM: &str = r#"using System;

namespace ConsoleApplication1
{
    class TypeName
    {
        public void Bar()
        {
            Foo($"abc{1}", obj2 : $"abc{2}");
        }

        public void Foo(object obj, object obj2)
        {
        }
    }
}
"#;

#[test]
fn test_reports_findings() -> Result<()> {
    let test = CliTest::with_file("Program.cs", PROGRAM)?.with_git_root()?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains(
        "error: \"Raw data values from interpolated string are lost due to cast to an object.\"  PreserveFormattableStringForObjParams"
    ));
    assert!(output.stdout.contains("--> ./Program.cs:9:17"));
    assert!(output.stdout.contains("--> ./Program.cs:9:28"));
    assert!(output.stdout.contains("9 |             Foo($\"abc{1}\", obj2 : $\"abc{2}\");"));
    assert!(
        output
            .stdout
            .contains("= note: argument binds to parameter `obj2` of `TypeName.Foo`")
    );
    assert!(output.stdout.contains("✘ 2 problems (2 errors, 0 warnings)"));

    Ok(())
}

#[test]
fn test_clean_project() -> Result<()> {
    let test = CliTest::with_file(
        "src/Service.cs",
        r#"class Service
{
    void Run(int id)
    {
        Audit((FormattableString)$"user {id}");
        Audit("plain");
        Console.WriteLine($"unresolved {id}");
    }

    void Audit(object entry) { }
}
"#,
    )?
    .with_git_root()?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(0));
    assert!(
        output
            .stdout
            .contains("✓ Checked 1 source file - no issues found")
    );

    Ok(())
}

#[test]
fn test_parse_error_exit_code() -> Result<()> {
    let test = CliTest::with_file("Broken.cs", "class Broken { void M() { Foo($\"x); } }")?
        .with_git_root()?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(2));
    assert!(output.stdout.contains("parse-error"));
    assert!(output.stdout.contains("--> ./Broken.cs"));
    assert!(output.stderr.contains("1 file(s) could not be parsed"));

    Ok(())
}

#[test]
fn test_config_ignores() -> Result<()> {
    let test = CliTest::new()?.with_git_root()?;
    test.write_file(
        ".fmtguardrc.json",
        r#"{
         "ignores": ["**/Generated/**"]
     }"#,
    )?;
    test.write_file("src/Generated/Program.cs", PROGRAM)?;
    test.write_file("src/App.cs", "class App { }")?;

    let output = run(test.check_command())?;

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("Checked 1 source file"));

    Ok(())
}

#[test]
fn test_source_root_argument() -> Result<()> {
    let test = CliTest::new()?.with_git_root()?;
    test.write_file("service/Program.cs", PROGRAM)?;

    let mut cmd = test.check_command();
    cmd.args(["--source-root", "service"]);
    let output = run(cmd)?;

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.contains("service/Program.cs:9:17"));

    Ok(())
}

#[test]
fn test_help() -> Result<()> {
    let test = CliTest::new()?;

    let output = run({
        let mut cmd = test.command();
        cmd.arg("--help");
        cmd
    })?;

    assert_eq!(output.code, Some(0));
    for command in ["check", "fix", "init", "serve"] {
        assert!(output.stdout.contains(command));
    }

    Ok(())
}
