use std::sync::Barrier;

use super::*;

fn speech_output(text: &str) -> RenderOutput {
    RenderOutput::Speech {
        audio: format!("RIFF:{text}").into_bytes(),
        duration: Duration::from_millis(1500),
    }
}

fn visible_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn second_resolve_does_not_render_again() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let request = RenderRequest::speech("JT", "Hello there.");
    let calls = AtomicU64::new(0);

    let first = cache
        .resolve(&request, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(speech_output("hello"))
        })
        .unwrap();
    let second = cache
        .resolve(&request, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(speech_output("hello"))
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(cache.stats(), CacheStats { hits: 1, renders: 1 });
}

#[test]
fn artifacts_survive_across_cache_instances() {
    let dir = tempfile::tempdir().unwrap();
    let request = RenderRequest::speech("JT", "Persist me.");

    let first = RenderCache::open(dir.path())
        .unwrap()
        .resolve(&request, || Ok(speech_output("persist")))
        .unwrap();

    let reopened = RenderCache::open(dir.path()).unwrap();
    let second = reopened
        .resolve(&request, || panic!("renderer must not run on a warm cache"))
        .unwrap();

    assert_eq!(first, second);
    let audio = second.into_audio().unwrap();
    assert_eq!(audio.duration, Duration::from_millis(1500));
    assert_eq!(std::fs::read(&audio.path).unwrap(), b"RIFF:persist");
    assert_eq!(reopened.stats(), CacheStats { hits: 1, renders: 0 });
}

#[test]
fn artifact_names_are_derived_from_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let speech = RenderRequest::speech("JT", "Named.");
    let image = RenderRequest::code_image("print(1)", ".py");

    cache.resolve(&speech, || Ok(speech_output("n"))).unwrap();
    let img = cache
        .resolve(&image, || {
            Ok(RenderOutput::Image {
                png: vec![0x89, b'P', b'N', b'G'],
            })
        })
        .unwrap()
        .into_image()
        .unwrap();

    assert_eq!(
        img.path,
        dir.path().join(format!("{}.png", image.key()))
    );
    let mut expected = vec![
        format!("{}.json", speech.key()),
        format!("{}.wav", speech.key()),
        format!("{}.png", image.key()),
    ];
    expected.sort();
    assert_eq!(visible_files(dir.path()), expected);
}

#[test]
fn failed_render_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let request = RenderRequest::speech("JT", "Doomed.");

    let err = cache
        .resolve(&request, || Err(ScriptcastError::validation("voice unavailable")))
        .unwrap_err();
    match err {
        ScriptcastError::RenderFailed { kind, cause } => {
            assert_eq!(kind, RenderKind::Speech);
            assert!(cause.contains("voice unavailable"));
        }
        other => panic!("expected RenderFailed, got {other:?}"),
    }
    assert!(visible_files(dir.path()).is_empty());
    assert!(cache.lookup(&request).unwrap().is_none());

    // Retrying after the failure renders normally.
    cache.resolve(&request, || Ok(speech_output("ok"))).unwrap();
    assert!(cache.lookup(&request).unwrap().is_some());
}

#[test]
fn empty_or_mismatched_output_is_a_render_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();

    let err = cache
        .resolve(&RenderRequest::code_image("x", ".rs"), || {
            Ok(RenderOutput::Image { png: Vec::new() })
        })
        .unwrap_err();
    assert!(matches!(err, ScriptcastError::RenderFailed { .. }));

    let err = cache
        .resolve(&RenderRequest::code_image("y", ".rs"), || {
            Ok(speech_output("wrong kind"))
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptcastError::RenderFailed {
            kind: RenderKind::CodeImage,
            ..
        }
    ));
    assert!(visible_files(dir.path()).is_empty());
}

#[test]
fn audio_without_sidecar_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let request = RenderRequest::speech("JT", "Half written.");
    std::fs::write(
        cache.artifact_path(request.key(), RenderKind::Speech),
        b"orphan",
    )
    .unwrap();

    assert!(cache.lookup(&request).unwrap().is_none());
    let calls = AtomicU64::new(0);
    cache
        .resolve(&request, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(speech_output("fresh"))
        })
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn corrupt_sidecar_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let request = RenderRequest::speech("JT", "Corrupt.");
    cache.resolve(&request, || Ok(speech_output("a"))).unwrap();
    std::fs::write(dir.path().join(format!("{}.json", request.key())), b"{not json").unwrap();

    let reopened = RenderCache::open(dir.path()).unwrap();
    assert!(reopened.lookup(&request).unwrap().is_none());
}

#[test]
fn concurrent_requests_for_one_key_render_once() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let request = RenderRequest::speech("JT", "Everyone wants this.");
    let calls = AtomicU64::new(0);
    let barrier = Barrier::new(8);

    let results: Vec<Artifact> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache
                        .resolve(&request, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(50));
                            Ok(speech_output("shared"))
                        })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(cache.stats(), CacheStats { hits: 7, renders: 1 });
}

#[test]
fn concurrent_requests_for_distinct_keys_all_render() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let calls = AtomicU64::new(0);

    std::thread::scope(|s| {
        for i in 0..6 {
            let cache = &cache;
            let calls = &calls;
            s.spawn(move || {
                let request = RenderRequest::speech("JT", &format!("line {i}"));
                cache
                    .resolve(&request, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(speech_output(&i.to_string()))
                    })
                    .unwrap();
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(visible_files(dir.path()).len(), 12);
}

#[test]
fn same_content_under_different_kinds_is_not_shared() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let speech = RenderRequest::from_canonical(RenderKind::Speech, b"shared".to_vec());
    let image = RenderRequest::from_canonical(RenderKind::CodeImage, b"shared".to_vec());
    assert_eq!(speech.key(), image.key());

    let speech_calls = AtomicU64::new(0);
    let image_calls = AtomicU64::new(0);
    let barrier = Barrier::new(2);

    let (audio, img) = std::thread::scope(|s| {
        let audio = s.spawn(|| {
            barrier.wait();
            cache.resolve(&speech, || {
                speech_calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                Ok(speech_output("shared"))
            })
        });
        let img = s.spawn(|| {
            barrier.wait();
            cache.resolve(&image, || {
                image_calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                Ok(RenderOutput::Image {
                    png: vec![0x89, b'P', b'N', b'G'],
                })
            })
        });
        (audio.join().unwrap(), img.join().unwrap())
    });

    assert!(matches!(audio.unwrap(), Artifact::Audio(_)));
    assert!(matches!(img.unwrap(), Artifact::Image(_)));
    assert_eq!(speech_calls.load(Ordering::SeqCst), 1);
    assert_eq!(image_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_failure_is_shared_without_rerendering() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();
    let request = RenderRequest::speech("JT", "Nobody gets this.");
    let calls = AtomicU64::new(0);
    let barrier = Barrier::new(4);

    let results: Vec<ScriptcastResult<Artifact>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache.resolve(&request, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(50));
                        Err(ScriptcastError::validation("quota exceeded"))
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for result in results {
        match result {
            Err(ScriptcastError::RenderFailed { kind, cause }) => {
                assert_eq!(kind, RenderKind::Speech);
                assert!(cause.contains("quota exceeded"), "{cause}");
            }
            other => panic!("expected RenderFailed, got {other:?}"),
        }
    }
    assert_eq!(cache.stats(), CacheStats::default());
    assert!(visible_files(dir.path()).is_empty());
}

#[test]
fn settled_requests_leave_the_in_flight_map() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RenderCache::open(dir.path()).unwrap();

    for i in 0..5 {
        let request = RenderRequest::speech("JT", &format!("line {i}"));
        cache.resolve(&request, || Ok(speech_output("ok"))).unwrap();
        cache.resolve(&request, || Ok(speech_output("ok"))).unwrap();
    }
    let doomed = RenderRequest::code_image("boom", ".rs");
    cache
        .resolve(&doomed, || Err(ScriptcastError::validation("no carbon")))
        .unwrap_err();

    assert!(cache.in_flight.lock().unwrap().is_empty());
    assert_eq!(cache.stats(), CacheStats { hits: 5, renders: 5 });
}
