// Integration test utilities
//
// A stand-in JDK (a shell script named `java`) plus a local Maven-layout
// repository, so the harness can be exercised end to end without a JVM.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

/// Stand-in `java`
///
/// - `-version` prints a banner for `$FAKE_JAVA_VERSION` (default 25)
/// - `-jar ...` behaves like the console launcher: one passing test, or with
///   `FAKE_SUITE=native` a second test that fails without the native-access grant,
///   or with `FAKE_SUITE=latin1` one passing test whose name is not UTF-8
/// - `-m ... --no-tests` prints `ok`
/// - any other module run echoes its last argument and exits `$FAKE_EXIT`
///
/// Every invocation is appended to `invocations.log` next to the script.
const FAKE_JAVA: &str = r#"#!/bin/sh
here=$(cd "$(dirname "$0")" && pwd)
printf '%s\n' "$*" >> "$here/invocations.log"

if [ "$1" = "-version" ]; then
  echo "openjdk version \"${FAKE_JAVA_VERSION:-25}.0.1\" 2025-10-21" >&2
  exit 0
fi

grant=no
jar=no
last=""
for arg in "$@"; do
  case "$arg" in
    --enable-native-access=syspro.tm.RegexApp) grant=yes ;;
    -jar) jar=yes ;;
  esac
  last="$arg"
done

summary() {
  echo "Test run finished after 12 ms"
  echo "[         1 containers found      ]"
  echo "[         0 containers failed     ]"
  echo "[         $1 tests found           ]"
  echo "[         $1 tests started         ]"
  echo "[         $2 tests successful      ]"
  echo "[         $3 tests failed          ]"
}

if [ "$jar" = yes ]; then
  if [ "$FAKE_SUITE" = latin1 ]; then
    printf 'RegexTest > latin1Match(caf\351) PASSED\n'
    summary 1 1 0
    exit 0
  fi
  echo "RegexTest > literalMatch() PASSED"
  if [ "$FAKE_SUITE" = native ]; then
    if [ "$grant" = yes ]; then
      echo "RegexTest > nativeMatch() PASSED"
      summary 2 2 0
      exit 0
    fi
    echo "RegexTest > nativeMatch() FAILED"
    echo "java.lang.IllegalCallerException: access to restricted method" >&2
    summary 2 1 1
    exit 1
  fi
  summary 1 1 0
  exit 0
fi

if [ "$last" = "--no-tests" ]; then
  echo ok
  exit 0
fi

echo "RegexApp: $last"
exit "${FAKE_EXIT:-0}"
"#;

/// A project directory with a stand-in JDK and a seeded repository
pub struct Fixture {
    pub root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            root: TempDir::new().unwrap(),
        };
        fixture.install_java();
        fixture.publish("syspro.tm", "RegexApp", "1.0");
        fixture.publish("syspro.tm", "RegexApp", "1.1");
        fixture.publish(
            "org.junit.platform",
            "junit-platform-console-standalone",
            "1.14.1",
        );
        fs::create_dir_all(fixture.project().join("build/classes/java/main")).unwrap();
        fs::create_dir_all(fixture.project().join("build/classes/java/test")).unwrap();
        fixture.write_config("");
        fixture
    }

    pub fn project(&self) -> PathBuf {
        self.root.path().join("project")
    }

    pub fn repository(&self) -> PathBuf {
        self.root.path().join("repo")
    }

    pub fn java_home(&self) -> PathBuf {
        self.root.path().join("jdk")
    }

    fn install_java(&self) {
        let bin = self.java_home().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let java = bin.join("java");
        fs::write(&java, FAKE_JAVA).unwrap();
        fs::set_permissions(&java, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Place a jar in the repository under the Maven layout
    pub fn publish(&self, group: &str, name: &str, version: &str) {
        let dir = self
            .repository()
            .join(group.replace('.', "/"))
            .join(name)
            .join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{}-{}.jar", name, version)),
            format!("{}:{}:{}", group, name, version),
        )
        .unwrap();
    }

    /// Empty the repository
    pub fn wipe_repository(&self) {
        fs::remove_dir_all(self.repository()).unwrap();
        fs::create_dir_all(self.repository()).unwrap();
    }

    /// Write `harness.toml` with the repository and JDK, plus `extra` TOML
    pub fn write_config(&self, extra: &str) {
        fs::create_dir_all(self.project()).unwrap();
        let config = format!(
            "[[repository]]\nname = \"local\"\nurl = \"{}\"\n\n[java]\nhome = \"{}\"\n\n{}\n",
            self.repository().display(),
            self.java_home().display(),
            extra
        );
        fs::write(self.project().join("harness.toml"), config).unwrap();
    }

    /// Launcher invocations so far, one argument string per line
    pub fn invocations(&self) -> Vec<String> {
        match fs::read_to_string(self.java_home().join("bin/invocations.log")) {
            Ok(log) => log.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Invocations other than the `-version` probe
    pub fn task_invocations(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter(|line| line != "-version")
            .collect()
    }

    /// The harness binary, pointed at this project
    pub fn harness(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("regex-harness");
        cmd.arg("--project-dir").arg(self.project());
        cmd.env_remove("FAKE_SUITE")
            .env_remove("FAKE_EXIT")
            .env_remove("FAKE_JAVA_VERSION");
        cmd
    }
}
