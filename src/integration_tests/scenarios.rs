//! Launch scenarios run against the recording platform.

use std::io;

use super::fake::{Event, FakePlatform, Step};
use super::util;
use crate::launch::{LaunchError, Launcher, Platform, PrivilegeError, ProcessAccess, ProcessId, SpawnError};
use crate::session::SessionError;

const DESKTOP_PID: u32 = 4242;
const TRAY_EXE: &str = "/opt/tray/tray-app";

fn launcher(platform: FakePlatform) -> Launcher<FakePlatform> {
    util::init_logging();
    Launcher::new(platform)
}

fn is_open_process(e: &Event) -> bool {
    matches!(e, Event::OpenProcess { .. })
}

/// The shell's environment comes first, the extra entries after it.
#[test]
fn merges_parent_environment_then_extra() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &["A=1", "B=2"]));
    l.launch_as_current_interactive_user(TRAY_EXE, &["C=3"])
        .expect("launch should succeed");
    assert_eq!(
        l.platform().created_env(),
        Some(vec!["A=1".to_string(), "B=2".to_string(), "C=3".to_string()])
    );
}

/// Keys already present are appended again, not replaced.
#[test]
fn duplicate_keys_are_kept_in_order() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &["PATH=C:\\Windows", "A=1"]));
    l.launch_as_current_interactive_user(TRAY_EXE, &["A=2", "Z=0", "A=3"])
        .expect("launch should succeed");
    assert_eq!(
        l.platform().created_env().unwrap(),
        vec!["PATH=C:\\Windows", "A=1", "A=2", "Z=0", "A=3"]
    );
}

#[test]
fn full_sequence_in_order() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &["USERNAME=alice"]));
    l.launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .expect("launch should succeed");

    assert_eq!(
        l.platform().events(),
        vec![
            Event::Impersonate,
            Event::OpenThreadToken(101),
            Event::LookupPrivilege("SeDebugPrivilege".to_string()),
            Event::EnablePrivilege(101),
            Event::CloseToken(101),
            Event::OpenProcess {
                pid: DESKTOP_PID,
                access: ProcessAccess::PARENT,
            },
            Event::OpenProcessToken(102),
            Event::TokenEnvironment(103),
            Event::CreateProcess {
                exe: TRAY_EXE.to_string(),
                env: vec!["USERNAME=alice".to_string()],
                parent: DESKTOP_PID,
            },
            Event::CloseToken(103),
            Event::CloseProcess(102),
            Event::Revert,
        ]
    );
    assert_eq!(l.platform().leaked(), 0);
}

#[test]
fn requests_exactly_the_parent_rights() {
    let access = ProcessAccess::PARENT;
    assert_eq!(access.bits(), 0x0080 | 0x0400 | 0x0040);
    assert!(access.contains(ProcessAccess::CREATE_PROCESS));
    assert!(access.contains(ProcessAccess::QUERY_INFORMATION | ProcessAccess::DUP_HANDLE));
}

#[test]
fn no_desktop_window() {
    let l = launcher(FakePlatform::no_desktop());
    let err = l
        .launch_as_current_interactive_user(TRAY_EXE, &["C=3"])
        .unwrap_err();
    assert!(
        matches!(err, LaunchError::Desktop(SessionError::NoActiveSession)),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(err.to_string(), "failed to find desktop: no shell process is present");
    assert_eq!(l.platform().count(is_open_process), 0);
    assert!(l.platform().events().is_empty());
}

#[test]
fn desktop_window_without_process() {
    let l = launcher(FakePlatform::desktop(0, &[]));
    let err = l
        .launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .unwrap_err();
    match err {
        LaunchError::Desktop(SessionError::InvalidSessionProcess { window }) => {
            assert_eq!(window, format!("{:?}", 0x10010usize));
        }
        e => panic!("unexpected error: {:?}", e),
    }
    assert_eq!(l.platform().count(is_open_process), 0);
}

/// A failed elevation stops the launch before the shell process is touched.
#[test]
fn elevation_failure_stops_before_open() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &[]).failing_at(Step::EnablePrivilege));
    let err = l
        .launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .unwrap_err();
    match &err {
        LaunchError::Start(SpawnError::Privilege(PrivilegeError::AdjustFailed { name, source })) => {
            assert_eq!(name.as_str(), "SeDebugPrivilege");
            assert_eq!(source.raw_os_error(), Some(5));
        }
        e => panic!("unexpected error: {:?}", e),
    }
    assert!(err.to_string().starts_with("failed to start executable: "));

    let p = l.platform();
    assert_eq!(p.count(is_open_process), 0);
    // The scope still ends, after the thread token is closed.
    assert_eq!(p.events().last(), Some(&Event::Revert));
    assert_eq!(p.count(|e| *e == Event::Revert), 1);
    assert!(!p.impersonating());
    assert_eq!(p.leaked(), 0);
}

/// A token that does not hold the privilege at all is refused, even though
/// the adjustment call itself reports only a partial assignment.
#[test]
fn privilege_not_assigned_stops_before_open() {
    const ERROR_NOT_ALL_ASSIGNED: i32 = 1300;
    let l = launcher(
        FakePlatform::desktop(DESKTOP_PID, &[]).failing_with(Step::EnablePrivilege, ERROR_NOT_ALL_ASSIGNED),
    );
    let err = l
        .launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .unwrap_err();
    match &err {
        LaunchError::Start(SpawnError::Privilege(PrivilegeError::AdjustFailed { source, .. })) => {
            assert_eq!(source.raw_os_error(), Some(ERROR_NOT_ALL_ASSIGNED));
        }
        e => panic!("unexpected error: {:?}", e),
    }
    let p = l.platform();
    assert_eq!(p.count(is_open_process), 0);
    assert!(p.created_env().is_none());
    assert!(!p.impersonating());
}

#[test]
fn privilege_lookup_failure() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &[]).failing_at(Step::LookupPrivilege));
    let err = l
        .launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .unwrap_err();
    assert!(
        matches!(
            err,
            LaunchError::Start(SpawnError::Privilege(PrivilegeError::LookupFailed { .. }))
        ),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(l.platform().count(is_open_process), 0);
}

/// Every failure point, many times over: each open is paired with one close,
/// and impersonation always ends.
#[test]
fn fault_at_every_step_leaks_nothing() {
    for step in Step::ALL {
        for _ in 0..16 {
            let l = launcher(FakePlatform::desktop(DESKTOP_PID, &["A=1"]).failing_at(step));
            let err = match l.launch_as_current_interactive_user(TRAY_EXE, &["B=2"]) {
                Err(LaunchError::Start(e)) => e,
                r => panic!("{:?}: unexpected result: {:?}", step, r),
            };
            let expected = match step {
                Step::Impersonate | Step::ThreadToken => "impersonate",
                Step::LookupPrivilege => "privilege lookup",
                Step::EnablePrivilege => "privilege adjust",
                Step::OpenProcess => "open process",
                Step::OpenToken => "open token",
                Step::Environment => "read environment",
                Step::CreateProcess => "create process",
            };
            assert_eq!(err.step(), expected, "{:?}", step);
            assert_eq!(err.os_error().raw_os_error(), Some(5), "{:?}", step);

            let p = l.platform();
            assert_eq!(p.leaked(), 0, "{:?} leaked handles", step);
            assert!(p.balanced(), "{:?} unbalanced open/close", step);
            assert!(!p.impersonating(), "{:?} left the thread impersonating", step);
            assert_eq!(
                p.count(|e| *e == Event::Revert),
                p.count(|e| *e == Event::Impersonate),
                "{:?}",
                step
            );
            assert!(p.created_env().is_none() || step == Step::CreateProcess);
        }
    }
}

/// The privilege is granted to the impersonation token only, and is gone
/// once the scope ends.
#[test]
fn ambient_security_context_is_unchanged() {
    for fail_at in [None, Some(Step::OpenProcess), Some(Step::CreateProcess)] {
        let mut platform = FakePlatform::desktop(DESKTOP_PID, &[]);
        if let Some(step) = fail_at {
            platform = platform.failing_at(step);
        }
        let l = launcher(platform);
        let _ = l.launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str]);

        let p = l.platform();
        assert!(p.process_privileges().is_empty(), "{:?}", fail_at);
        assert!(p.thread_privileges().is_empty(), "{:?}", fail_at);
        assert!(!p.impersonating(), "{:?}", fail_at);
    }
}

#[test]
fn security_calls_stay_on_one_thread() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &[]));
    l.launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .expect("launch should succeed");
    let threads = l.platform().security_threads();
    assert!(threads.len() >= 4);
    assert!(threads.iter().all(|t| *t == std::thread::current().id()));
}

/// Opening the shell process, its token and environment, and creating the
/// process all happen while this thread is impersonating.
#[test]
fn process_calls_run_while_impersonating() {
    let mut runs = vec![FakePlatform::desktop(DESKTOP_PID, &["A=1"])];
    runs.extend(
        [Step::OpenToken, Step::Environment, Step::CreateProcess]
            .into_iter()
            .map(|step| FakePlatform::desktop(DESKTOP_PID, &["A=1"]).failing_at(step)),
    );
    for platform in runs {
        let l = launcher(platform);
        let _ = l.launch_as_current_interactive_user(TRAY_EXE, &["B=2"]);
        let p = l.platform();
        assert!(p.unscoped_calls().is_empty(), "{:?}", p.unscoped_calls());
        assert!(p.security_threads().iter().all(|t| *t == std::thread::current().id()));
        assert!(!p.impersonating());
    }

    // The recorder does notice a call made outside impersonation.
    let p = FakePlatform::desktop(DESKTOP_PID, &[]);
    let process = p
        .open_process(ProcessId(DESKTOP_PID), ProcessAccess::PARENT)
        .expect("open should succeed");
    p.close_process(process);
    assert_eq!(p.unscoped_calls(), vec!["open_process"]);
}

/// Parent environment entries that are not valid UTF-16 reach process
/// creation unchanged, followed by the extra entries.
#[test]
fn unpaired_surrogate_in_parent_environment_is_passed_through() {
    let u = |c: char| c as u16;
    let odd = vec![u('U'), u('='), u('a'), 0xDC00, u('b')];
    let plain = vec![u('B'), u('='), u('2')];
    let l = launcher(FakePlatform::desktop_wide(DESKTOP_PID, vec![odd.clone(), plain.clone()]));
    l.launch_as_current_interactive_user(TRAY_EXE, &["C=3"])
        .expect("launch should succeed");

    let mut expected = odd;
    expected.push(0);
    expected.extend(plain);
    expected.push(0);
    expected.extend([u('C'), u('='), u('3'), 0, 0]);
    assert_eq!(l.platform().created_block(), Some(expected));
    assert_eq!(
        l.platform().created_env().unwrap(),
        vec!["U=a\u{FFFD}b", "B=2", "C=3"]
    );
}

/// Separate launches on separate threads do not share impersonation state.
#[test]
fn concurrent_launches_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let l = launcher(FakePlatform::desktop(DESKTOP_PID + i, &["A=1"]));
                l.launch_as_current_interactive_user(TRAY_EXE, &[format!("N={}", i)])
                    .map(|_| l.platform().created_env())
                    .map_err(|e| e.to_string())
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let env = h.join().expect("thread panicked").expect("launch should succeed");
        assert_eq!(env, Some(vec!["A=1".to_string(), format!("N={}", i)]));
    }
}

/// A bare program name that is not on PATH fails at creation, after the
/// shell handles were opened, and they are still closed.
#[test]
fn missing_program_on_path() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &[]));
    let err = l
        .launch_as_current_interactive_user("sessionhop-no-such-tray-9c1e", &[] as &[&str])
        .unwrap_err();
    match err {
        LaunchError::Start(SpawnError::ProcessCreationFailed { exe, source }) => {
            assert_eq!(exe, "sessionhop-no-such-tray-9c1e");
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        e => panic!("unexpected error: {:?}", e),
    }
    let p = l.platform();
    assert!(p.created_env().is_none());
    assert_eq!(p.leaked(), 0);
    assert!(!p.impersonating());
}

#[test]
fn spawn_as_child_uses_given_parent() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &["A=1"]));
    l.spawn_as_child(crate::ProcessId(77), TRAY_EXE, &["B=2"])
        .expect("spawn should succeed");
    assert_eq!(
        l.platform()
            .events()
            .iter()
            .find_map(|e| match e {
                Event::CreateProcess { parent, .. } => Some(*parent),
                _ => None,
            }),
        Some(77)
    );
}

#[test]
fn open_failure_message_names_process() {
    let l = launcher(FakePlatform::desktop(DESKTOP_PID, &[]).failing_at(Step::OpenProcess));
    let err = l
        .launch_as_current_interactive_user(TRAY_EXE, &[] as &[&str])
        .unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.starts_with("failed to start executable: could not open process 4242: "),
        "{}",
        msg
    );
    let io_err: io::Error = err.into();
    assert!(io_err.to_string().contains("4242"));
}
