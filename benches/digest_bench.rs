use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hashguard::cancel::CancellationToken;
use hashguard::diff;
use hashguard::digest::{Algorithm, Hasher};
use hashguard::manifest::{FileRecord, Manifest};
use hashguard::scanner::{ScanOptions, TreeScanner};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use tempfile::tempdir;

fn create_tree(root: &Path, dirs: usize, files_per_dir: usize) {
    for d in 0..dirs {
        let dir = root.join(format!("dir_{d}"));
        fs::create_dir_all(&dir).unwrap();
        for f in 0..files_per_dir {
            let content = format!("file {f} in directory {d}\n").repeat(64);
            fs::write(dir.join(format!("file_{f}.txt")), content).unwrap();
        }
    }
}

fn benchmark_file_digest(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();
    let mut group = c.benchmark_group("file_digest");

    for (label, size) in [("1kb", 1024), ("1mb", 1024 * 1024), ("16mb", 16 * 1024 * 1024)] {
        let path = dir.path().join(label);
        fs::write(&path, vec![0xA5u8; size]).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        for algorithm in Algorithm::ALL {
            let hasher = Hasher::new(algorithm);
            group.bench_with_input(BenchmarkId::new(algorithm.name(), label), &path, |b, path| {
                b.iter(|| hasher.digest_file(black_box(path), &cancel));
            });
        }
    }

    group.finish();
}

fn benchmark_tree_scan(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_tree(dir.path(), 20, 50);

    let mut group = c.benchmark_group("tree_scan");
    group.sample_size(20);

    for threads in [1, 4, 0] {
        let options = ScanOptions {
            threads,
            ..ScanOptions::default()
        };
        let scanner = TreeScanner::new(dir.path(), options).unwrap();
        let label = if threads == 0 { "all_cpus".to_string() } else { threads.to_string() };
        group.bench_function(BenchmarkId::new("threads", label), |b| {
            b.iter(|| black_box(scanner.scan().unwrap()));
        });
    }

    group.finish();
}

fn manifest_of(count: usize, salt: &str) -> Manifest {
    let hasher = Hasher::new(Algorithm::Sha256);
    let records = (0..count).map(|i| {
        // Every tenth file differs between salts
        let content = if i % 10 == 0 { format!("{i}{salt}") } else { i.to_string() };
        FileRecord::new(
            format!("dir_{}/file_{i}", i % 100),
            hasher.digest_bytes(content.as_bytes()),
        )
    });
    Manifest::from_records(Algorithm::Sha256, records).unwrap()
}

fn benchmark_diff(c: &mut Criterion) {
    let baseline = manifest_of(50_000, "");
    let current = manifest_of(50_000, "changed");

    c.bench_function("diff_50k_paths", |b| {
        b.iter(|| diff::diff(black_box(&baseline), black_box(&current)).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_file_digest,
    benchmark_tree_scan,
    benchmark_diff
);
criterion_main!(benches);
