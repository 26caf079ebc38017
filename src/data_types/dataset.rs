/// DeepVariant release used for pulled images
pub const BIN_VERSION: &str = "1.5.0";
/// Evaluation image for hap.py
pub const HAPPY_IMAGE: &str = "jmcdani20/hap.py:v0.3.12";
/// Joint genotyping image for trio merges
pub const GLNEXUS_IMAGE: &str = "quay.io/mlin/glnexus:v1.2.7";
/// RTG Tools image, its entrypoint is `rtg`
pub const RTG_IMAGE: &str = "realtimegenomics/rtg-tools:3.12.1";

const CASE_STUDY_DATA: &str = "https://storage.googleapis.com/deepvariant/case-study-testdata";
const GIAB_RELEASE: &str = "https://ftp-trace.ncbi.nlm.nih.gov/ReferenceSamples/giab/release/AshkenazimTrio";
const REFERENCE: &str = "GRCh38_no_alt_analysis_set.fasta";

/// A remote object and the local file name it lands in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFile {
    pub url: String,
    pub name: String
}

impl RemoteFile {
    fn new(base: &str, name: &str) -> Self {
        RemoteFile { url: format!("{base}/{name}"), name: name.to_string() }
    }
}

/// The position a sample holds in a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::AsRefStr)]
pub enum SampleRole {
    #[strum(serialize = "single")]
    Single,
    #[strum(serialize = "child")]
    Child,
    #[strum(serialize = "parent1")]
    Parent1,
    #[strum(serialize = "parent2")]
    Parent2
}

/// Per-sample inputs and outputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub name: String,
    pub role: SampleRole,
    pub reads: String,
    pub truth_vcf: String,
    pub truth_bed: String,
    /// GIAB folder holding the truth files for this individual
    giab_folder: String
}

impl Sample {
    fn new(name: &str, role: SampleRole, reads: &str, giab_folder: &str) -> Self {
        Sample {
            name: name.to_string(),
            role,
            reads: reads.to_string(),
            truth_vcf: format!("{name}_GRCh38_1_22_v4.2.1_benchmark.vcf.gz"),
            truth_bed: format!("{name}_GRCh38_1_22_v4.2.1_benchmark_noinconsistent.bed"),
            giab_folder: giab_folder.to_string()
        }
    }

    pub fn output_vcf(&self) -> String {
        format!("{}.output.vcf.gz", self.name)
    }

    pub fn output_gvcf(&self) -> String {
        format!("{}.output.g.vcf.gz", self.name)
    }
}

/// Fixed set of files a case study downloads and produces
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    /// uncompressed reference file name, the download is `<reference>.gz`
    pub reference: String,
    pub samples: Vec<Sample>,
    /// exome capture kit, only for WES
    pub capture_bed: Option<String>
}

impl Dataset {
    /// HG003 exome sequenced with the IDT capture kit
    pub fn wes() -> Self {
        Dataset {
            reference: REFERENCE.to_string(),
            samples: vec![
                Sample::new("HG003", SampleRole::Single, "HG003.novaseq.wes_idt.100x.dedup.bam", "HG003_NA24149_father")
            ],
            capture_bed: Some("idt_capture_novogene.grch38.bed".to_string())
        }
    }

    /// HG002 with both parents, chr20 PCR-free NovaSeq
    pub fn trio() -> Self {
        Dataset {
            reference: REFERENCE.to_string(),
            samples: vec![
                Sample::new("HG002", SampleRole::Child, "HG002.novaseq.pcr-free.35x.dedup.grch38_no_alt.chr20.bam", "HG002_NA24385_son"),
                Sample::new("HG003", SampleRole::Parent1, "HG003.novaseq.pcr-free.35x.dedup.grch38_no_alt.chr20.bam", "HG003_NA24149_father"),
                Sample::new("HG004", SampleRole::Parent2, "HG004.novaseq.pcr-free.35x.dedup.grch38_no_alt.chr20.bam", "HG004_NA24143_mother")
            ],
            capture_bed: None
        }
    }

    pub fn reference_gz(&self) -> String {
        format!("{}.gz", self.reference)
    }

    pub fn sample(&self, role: SampleRole) -> Option<&Sample> {
        self.samples.iter().find(|s| s.role == role)
    }

    /// Every remote object the run needs, in download order
    pub fn remote_files(&self) -> Vec<RemoteFile> {
        let ref_gz = self.reference_gz();
        let mut files = vec![
            RemoteFile::new(CASE_STUDY_DATA, &ref_gz),
            RemoteFile::new(CASE_STUDY_DATA, &format!("{ref_gz}.fai")),
            RemoteFile::new(CASE_STUDY_DATA, &format!("{ref_gz}.gzi")),
        ];
        for sample in self.samples.iter() {
            files.push(RemoteFile::new(CASE_STUDY_DATA, &sample.reads));
            files.push(RemoteFile::new(CASE_STUDY_DATA, &format!("{}.bai", sample.reads)));

            let truth_base = format!("{GIAB_RELEASE}/{}/NISTv4.2.1/GRCh38", sample.giab_folder);
            files.push(RemoteFile::new(&truth_base, &sample.truth_vcf));
            files.push(RemoteFile::new(&truth_base, &format!("{}.tbi", sample.truth_vcf)));
            files.push(RemoteFile::new(&truth_base, &sample.truth_bed));
        }
        if let Some(capture) = self.capture_bed.as_deref() {
            files.push(RemoteFile::new(CASE_STUDY_DATA, capture));
        }
        files
    }
}
