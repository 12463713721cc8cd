use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use stprep::pipeline::defaults::SpmCliTrainer;
use stprep::{
    CmvnType, CorpusPreparerBuilder, FilterConfig, PrepConfig, PrepError, TargetLang, Task,
    VocabType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LangChoice {
    De,
    Ja,
    Zh,
}

impl LangChoice {
    fn target_lang(self) -> TargetLang {
        match self {
            Self::De => TargetLang::De,
            Self::Ja => TargetLang::Ja,
            Self::Zh => TargetLang::Zh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TaskChoice {
    Asr,
    St,
}

impl TaskChoice {
    fn task(self) -> Task {
        match self {
            Self::Asr => Task::Asr,
            Self::St => Task::St,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VocabChoice {
    Bpe,
    Unigram,
    Char,
}

impl VocabChoice {
    fn vocab_type(self) -> VocabType {
        match self {
            Self::Bpe => VocabType::Bpe,
            Self::Unigram => VocabType::Unigram,
            Self::Char => VocabType::Char,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CmvnChoice {
    Utterance,
    Global,
}

impl CmvnChoice {
    fn cmvn_type(self) -> CmvnType {
        match self {
            Self::Utterance => CmvnType::Utterance,
            Self::Global => CmvnType::Global,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "prep_mustc")]
#[command(about = "Prepare a MuST-C speech-translation corpus for model training")]
struct Args {
    #[arg(long, short = 'd', env = "STPREP_DATA_ROOT")]
    data_root: PathBuf,
    #[arg(long, env = "STPREP_OUTPUT")]
    output: Option<PathBuf>,
    #[arg(long, env = "STPREP_LANG", value_enum, required = true, num_args = 1..)]
    lang: Vec<LangChoice>,
    #[arg(long, env = "STPREP_TASK", value_enum, required = true, num_args = 1..)]
    task: Vec<TaskChoice>,
    #[arg(
        long,
        env = "STPREP_VOCAB_TYPE",
        value_enum,
        default_value_t = VocabChoice::Unigram
    )]
    vocab_type: VocabChoice,
    #[arg(
        long,
        env = "STPREP_VOCAB_SIZE",
        default_value_t = PrepConfig::DEFAULT_VOCAB_SIZE
    )]
    vocab_size: usize,
    /// Per-task override; 0 inherits --vocab-size.
    #[arg(long, env = "STPREP_VOCAB_SIZE_ASR", default_value_t = 0)]
    vocab_size_asr: usize,
    /// Per-task override; 0 inherits --vocab-size.
    #[arg(long, env = "STPREP_VOCAB_SIZE_ST", default_value_t = 0)]
    vocab_size_st: usize,
    #[arg(
        long,
        env = "STPREP_CMVN_TYPE",
        value_enum,
        default_value_t = CmvnChoice::Utterance
    )]
    cmvn_type: CmvnChoice,
    /// Maximum number of training utterances used to estimate global mean
    /// and variance.
    #[arg(
        long,
        env = "STPREP_GCMVN_MAX_NUM",
        default_value_t = PrepConfig::DEFAULT_GCMVN_MAX_NUM
    )]
    gcmvn_max_num: usize,
    #[arg(
        long,
        env = "STPREP_MIN_N_FRAMES",
        default_value_t = FilterConfig::DEFAULT_MIN_N_FRAMES
    )]
    min_n_frames: i64,
    #[arg(
        long,
        env = "STPREP_MAX_N_FRAMES",
        default_value_t = FilterConfig::DEFAULT_MAX_N_FRAMES
    )]
    max_n_frames: i64,
    #[arg(
        long,
        env = "STPREP_MAX_FRAMES_PER_TGT_CHAR",
        default_value_t = FilterConfig::DEFAULT_MAX_FRAMES_PER_TGT_CHAR
    )]
    max_frames_per_tgt_char: f64,
    #[arg(long, env = "STPREP_SPM_TRAIN", default_value = "spm_train")]
    spm_train_bin: PathBuf,
    #[arg(long, env = "STPREP_VERBOSE", default_value_t = false)]
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), PrepError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    let config = PrepConfig {
        data_root: args.data_root,
        output_root: args.output,
        languages: args.lang.iter().map(|lang| lang.target_lang()).collect(),
        tasks: args.task.iter().map(|task| task.task()).collect(),
        vocab_type: args.vocab_type.vocab_type(),
        vocab_size: args.vocab_size,
        vocab_size_asr: args.vocab_size_asr,
        vocab_size_st: args.vocab_size_st,
        cmvn_type: args.cmvn_type.cmvn_type(),
        gcmvn_max_num: args.gcmvn_max_num,
        filter: FilterConfig {
            min_n_frames: args.min_n_frames,
            max_n_frames: args.max_n_frames,
            max_frames_per_tgt_char: args.max_frames_per_tgt_char,
        },
    };

    CorpusPreparerBuilder::new(config)
        .with_subword_trainer(Box::new(SpmCliTrainer::new(args.spm_train_bin)))
        .build()?
        .run()
}
